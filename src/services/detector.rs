use serde::Serialize;

use crate::services::features::{AudioFeatures, FeatureExtractor};

// Decision boundaries separating synthetic from natural speech statistics.
const PITCH_CV_AI_MAX: f32 = 0.08;
const PITCH_CV_HUMAN_MIN: f32 = 0.12;
const PITCH_STD_AI_MAX: f32 = 15.0;
const MFCC_VARIANCE_AI_MAX: f32 = 80.0;
const MFCC_DELTA_STD_AI_MAX: f32 = 10.0;
const SPECTRAL_FLATNESS_AI_MIN: f32 = 0.05;
const SPECTRAL_CENTROID_STD_AI_MAX: f32 = 200.0;
const SILENCE_RATIO_AI_MAX: f32 = 0.03;
const SILENCE_RATIO_AI_MIN: f32 = 0.35;
const JITTER_AI_MAX: f32 = 0.02;
const HARMONIC_RATIO_AI_MIN: f32 = 50.0;

/// Weighted AI probability at or above which audio is labelled AI-generated.
const AI_DECISION_THRESHOLD: f32 = 0.55;

const AI_KEYWORDS: [&str; 8] = [
    "unnatural",
    "lack",
    "missing",
    "unusual",
    "limited",
    "low",
    "synthetic",
    "clean",
];
const HUMAN_KEYWORDS: [&str; 4] = ["natural", "present", "human", "normal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Pitch,
    Mfcc,
    Spectral,
    Temporal,
    VoiceQuality,
}

impl Category {
    fn weight(self) -> f32 {
        match self {
            Category::Pitch => 0.25,
            Category::Mfcc => 0.20,
            Category::Spectral => 0.20,
            Category::Temporal => 0.15,
            Category::VoiceQuality => 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    #[serde(rename = "AI_GENERATED")]
    AiGenerated,
    #[serde(rename = "HUMAN")]
    Human,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "AI_GENERATED",
            Classification::Human => "HUMAN",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub classification: Classification,
    pub confidence_score: f32,
    pub explanation: String,
}

/// AI vs human voice detection over a mono 16 kHz signal.
///
/// Five feature categories are scored independently against the thresholds
/// above and combined into a weighted AI probability. The reported confidence
/// is clamped to [0.51, 0.99] and rounded to two decimals.
pub struct VoiceDetector<'a> {
    y: &'a [f32],
    sample_rate: u32,
    scores: Vec<(Category, f32)>,
    indicators: Vec<&'static str>,
}

impl<'a> VoiceDetector<'a> {
    pub fn new(y: &'a [f32], sample_rate: u32) -> Self {
        Self {
            y,
            sample_rate,
            scores: Vec::new(),
            indicators: Vec::new(),
        }
    }

    pub fn detect(mut self) -> DetectionResult {
        let features = FeatureExtractor::new(self.y, self.sample_rate).extract();
        tracing::debug!(?features, "Extracted audio features");

        self.analyze_pitch(&features);
        self.analyze_mfcc(&features);
        self.analyze_spectral(&features);
        self.analyze_temporal(&features);
        self.analyze_voice_quality(&features);

        let ai_probability = self.final_score();
        let (classification, confidence) = if ai_probability >= AI_DECISION_THRESHOLD {
            (Classification::AiGenerated, ai_probability)
        } else {
            (Classification::Human, 1.0 - ai_probability)
        };
        let confidence = confidence.clamp(0.51, 0.99);
        let confidence = (confidence * 100.0).round() / 100.0;

        let explanation = self.explanation(classification);
        DetectionResult {
            classification,
            confidence_score: confidence,
            explanation,
        }
    }

    fn analyze_pitch(&mut self, features: &AudioFeatures) {
        let mut score;
        if features.pitch_cv < PITCH_CV_AI_MAX {
            score = 0.85;
            self.indicators.push("Unnaturally consistent pitch detected");
        } else if features.pitch_cv < PITCH_CV_HUMAN_MIN {
            score = 0.65;
            self.indicators.push("Limited pitch variation observed");
        } else {
            score = 0.25;
            self.indicators.push("Natural pitch variation present");
        }

        if features.pitch_std < PITCH_STD_AI_MAX && features.pitch_std > 0.0 {
            score = (score + 0.1f32).min(0.95);
        }

        self.scores.push((Category::Pitch, score));
    }

    fn analyze_mfcc(&mut self, features: &AudioFeatures) {
        let mut score;
        if features.mfcc_variance < MFCC_VARIANCE_AI_MAX {
            score = 0.75;
            self.indicators.push("Low spectral complexity detected");
        } else {
            score = 0.35;
        }

        if features.mfcc_delta_std < MFCC_DELTA_STD_AI_MAX {
            score = (score + 0.15f32).min(0.9);
            self.indicators.push("Limited dynamic speech patterns");
        }

        self.scores.push((Category::Mfcc, score));
    }

    fn analyze_spectral(&mut self, features: &AudioFeatures) {
        let mut score;
        if features.spectral_flatness_mean > SPECTRAL_FLATNESS_AI_MIN {
            score = 0.7;
            self.indicators.push("Unusual spectral characteristics");
        } else {
            score = 0.4;
        }

        if features.spectral_centroid_std < SPECTRAL_CENTROID_STD_AI_MAX {
            score = (score + 0.1f32).min(0.85);
        }

        self.scores.push((Category::Spectral, score));
    }

    fn analyze_temporal(&mut self, features: &AudioFeatures) {
        let score;
        if features.silence_ratio < SILENCE_RATIO_AI_MAX {
            score = 0.8;
            self.indicators.push("Lack of natural breathing pauses");
        } else if features.silence_ratio > SILENCE_RATIO_AI_MIN {
            score = 0.65;
            self.indicators.push("Unusual pause patterns detected");
        } else {
            score = 0.3;
            self.indicators.push("Natural speech rhythm detected");
        }

        self.scores.push((Category::Temporal, score));
    }

    fn analyze_voice_quality(&mut self, features: &AudioFeatures) {
        let mut score;
        if features.jitter < JITTER_AI_MAX {
            score = 0.8;
            self.indicators.push("Missing natural voice micro-variations");
        } else {
            score = 0.3;
            self.indicators.push("Natural voice tremor patterns present");
        }

        if features.harmonic_ratio > HARMONIC_RATIO_AI_MIN {
            score = (score + 0.1f32).min(0.9);
            self.indicators.push("Unusually clean audio signal");
        }

        self.scores.push((Category::VoiceQuality, score));
    }

    fn final_score(&self) -> f32 {
        let mut total = 0.0f32;
        let mut weight_sum = 0.0f32;
        for &(category, score) in &self.scores {
            total += score * category.weight();
            weight_sum += category.weight();
        }
        if weight_sum > 0.0 {
            total / weight_sum
        } else {
            0.5
        }
    }

    // Ties resolve to the earliest category scored, matching the fixed
    // pitch -> mfcc -> spectral -> temporal -> voice quality order.
    fn max_score_category(&self) -> Category {
        let mut best = self.scores[0];
        for &(category, score) in &self.scores[1..] {
            if score > best.1 {
                best = (category, score);
            }
        }
        best.0
    }

    fn min_score_category(&self) -> Category {
        let mut best = self.scores[0];
        for &(category, score) in &self.scores[1..] {
            if score < best.1 {
                best = (category, score);
            }
        }
        best.0
    }

    fn explanation(&self, classification: Classification) -> String {
        match classification {
            Classification::AiGenerated => {
                let matched = self.indicators.iter().find(|ind| {
                    let lower = ind.to_lowercase();
                    AI_KEYWORDS.iter().any(|kw| lower.contains(kw))
                });
                if let Some(indicator) = matched {
                    return (*indicator).to_string();
                }
                match self.max_score_category() {
                    Category::Pitch => {
                        "Unnatural pitch consistency and robotic speech patterns detected"
                    }
                    Category::Mfcc => "Synthetic spectral patterns identified in voice analysis",
                    Category::Spectral => "Artificial frequency distribution detected",
                    Category::Temporal => "Mechanical timing patterns without natural rhythm",
                    Category::VoiceQuality => {
                        "Missing natural voice micro-variations and tremors"
                    }
                }
                .to_string()
            }
            Classification::Human => {
                let matched = self.indicators.iter().find(|ind| {
                    let lower = ind.to_lowercase();
                    HUMAN_KEYWORDS.iter().any(|kw| lower.contains(kw))
                });
                if let Some(indicator) = matched {
                    return (*indicator).to_string();
                }
                match self.min_score_category() {
                    Category::Pitch => "Natural pitch variation consistent with human speech",
                    Category::Mfcc => "Complex spectral patterns typical of human voice",
                    Category::Spectral => "Natural frequency characteristics detected",
                    Category::Temporal => "Organic speech rhythm with natural pauses",
                    Category::VoiceQuality => {
                        "Natural voice micro-variations and breathing detected"
                    }
                }
                .to_string()
            }
        }
    }
}
