use voiceguard::services::detector::{Classification, VoiceDetector};
use voiceguard::services::features::FeatureExtractor;

const SAMPLE_RATE: u32 = 16_000;

fn sine(freq: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let n = (duration_secs * SAMPLE_RATE as f32) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Deterministic white noise from a full-avalanche integer mix, no RNG
/// dependency needed. Sequential inputs must come out decorrelated or the
/// spectrum grows tonal peaks.
fn pseudo_noise(i: usize) -> f32 {
    let mut x = (i as u32).wrapping_mul(0x9e37_79b9);
    x = (x ^ (x >> 16)).wrapping_mul(0x21f0_aaad);
    x = (x ^ (x >> 15)).wrapping_mul(0x735a_2d97);
    x ^= x >> 15;
    (x as f32 / u32::MAX as f32) * 2.0 - 1.0
}

fn noise(duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let n = (duration_secs * SAMPLE_RATE as f32) as usize;
    (0..n).map(|i| amplitude * pseudo_noise(i)).collect()
}

fn zero_out(y: &mut [f32], from_secs: f32, to_secs: f32) {
    let lo = (from_secs * SAMPLE_RATE as f32) as usize;
    let hi = ((to_secs * SAMPLE_RATE as f32) as usize).min(y.len());
    for v in &mut y[lo..hi] {
        *v = 0.0;
    }
}

/// Rough stand-in for speech: sustained pitch that steps between segments,
/// a slow tremolo, a little noise, and two breathing pauses.
fn speech_like() -> Vec<f32> {
    let duration_secs = 3.0f32;
    let segments = [120.0f32, 180.0, 140.0, 200.0];
    let n = (duration_secs * SAMPLE_RATE as f32) as usize;

    let mut y: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let segment = ((t / duration_secs) * segments.len() as f32) as usize;
            let freq = segments[segment.min(segments.len() - 1)];
            let tremolo = 1.0 + 0.5 * (2.0 * std::f32::consts::PI * 4.0 * t).sin();
            let tone = (2.0 * std::f32::consts::PI * freq * t).sin();
            0.35 * tremolo * tone + 0.05 * pseudo_noise(i)
        })
        .collect();

    zero_out(&mut y, 1.0, 1.3);
    zero_out(&mut y, 2.0, 2.3);
    y
}

#[test]
fn test_steady_sine_classified_as_ai() {
    let y = sine(200.0, 2.0, 0.5);
    let result = VoiceDetector::new(&y, SAMPLE_RATE).detect();

    assert_eq!(result.classification, Classification::AiGenerated);
    assert!(result.confidence_score >= 0.6);
    assert!(result.confidence_score <= 0.99);
    assert_eq!(result.explanation, "Unnaturally consistent pitch detected");
}

#[test]
fn test_speech_like_signal_classified_as_human() {
    let y = speech_like();
    let result = VoiceDetector::new(&y, SAMPLE_RATE).detect();

    assert_eq!(result.classification, Classification::Human);
    assert!(result.confidence_score >= 0.51);
    assert!(result.confidence_score <= 0.99);
    assert_eq!(result.explanation, "Natural pitch variation present");
}

#[test]
fn test_confidence_is_rounded_to_two_decimals() {
    for y in [sine(200.0, 2.0, 0.5), speech_like()] {
        let result = VoiceDetector::new(&y, SAMPLE_RATE).detect();
        let scaled = result.confidence_score * 100.0;
        assert!(
            (scaled.round() - scaled).abs() < 1e-3,
            "confidence {} not rounded",
            result.confidence_score
        );
    }
}

#[test]
fn test_pitch_tracking_locks_onto_tone() {
    let y = sine(200.0, 2.0, 0.5);
    let features = FeatureExtractor::new(&y, SAMPLE_RATE).extract();

    assert!(
        (features.pitch_mean - 200.0).abs() < 10.0,
        "pitch_mean {}",
        features.pitch_mean
    );
    assert!(features.pitch_cv < 0.05, "pitch_cv {}", features.pitch_cv);
}

#[test]
fn test_spectral_centroid_tracks_tone_frequency() {
    let y = sine(1000.0, 2.0, 0.5);
    let features = FeatureExtractor::new(&y, SAMPLE_RATE).extract();

    assert!(
        (features.spectral_centroid_mean - 1000.0).abs() < 50.0,
        "spectral_centroid_mean {}",
        features.spectral_centroid_mean
    );
}

#[test]
fn test_noise_is_flatter_than_tone() {
    let tone = FeatureExtractor::new(&sine(200.0, 2.0, 0.5), SAMPLE_RATE).extract();
    let hiss = FeatureExtractor::new(&noise(2.0, 0.5), SAMPLE_RATE).extract();

    assert!(
        tone.spectral_flatness_mean < 0.01,
        "tone flatness {}",
        tone.spectral_flatness_mean
    );
    assert!(
        hiss.spectral_flatness_mean > 0.2,
        "noise flatness {}",
        hiss.spectral_flatness_mean
    );
}

#[test]
fn test_silence_ratio_of_half_silent_clip() {
    let mut y = sine(200.0, 2.0, 0.5);
    zero_out(&mut y, 1.0, 2.0);
    let features = FeatureExtractor::new(&y, SAMPLE_RATE).extract();

    assert!(
        features.silence_ratio > 0.45 && features.silence_ratio < 0.6,
        "silence_ratio {}",
        features.silence_ratio
    );
}

#[test]
fn test_tremolo_raises_jitter() {
    let steady = FeatureExtractor::new(&sine(200.0, 2.0, 0.5), SAMPLE_RATE).extract();
    let wavering = FeatureExtractor::new(&speech_like(), SAMPLE_RATE).extract();

    assert!(steady.jitter < 0.02, "steady jitter {}", steady.jitter);
    assert!(wavering.jitter > 0.02, "wavering jitter {}", wavering.jitter);
}
