use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::detector::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    Tamil,
    English,
    Hindi,
    Malayalam,
    Telugu,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Tamil => "Tamil",
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Malayalam => "Malayalam",
            Language::Telugu => "Telugu",
        }
    }

    pub fn all() -> Vec<Language> {
        vec![
            Language::Tamil,
            Language::English,
            Language::Hindi,
            Language::Malayalam,
            Language::Telugu,
        ]
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDetectionRequest {
    pub language: Language,
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    #[validate(length(min = 100, message = "Invalid or empty audio data"))]
    pub audio_base64: String,
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDetectionResponse {
    pub status: &'static str,
    pub language: Language,
    pub classification: Classification,
    pub confidence_score: f32,
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            status: "error",
            message: message.into(),
        }
    }
}
