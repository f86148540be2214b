use axum::{http::StatusCode, Json};
use validator::Validate;

use crate::modules::detection::schema::{
    ErrorResponse, VoiceDetectionRequest, VoiceDetectionResponse,
};
use crate::services::audio::{self, AudioError};
use crate::services::detector::{DetectionResult, VoiceDetector};

pub async fn detect_voice(
    Json(payload): Json<VoiceDetectionRequest>,
) -> Result<Json<VoiceDetectionResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = payload.validate() {
        // Surface the declared message alone; `ValidationErrors::to_string`
        // would prefix it with the field name.
        let message = e
            .field_errors()
            .into_values()
            .flatten()
            .find_map(|err| err.message.clone())
            .map(|m| m.into_owned())
            .unwrap_or_else(|| e.to_string());
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))));
    }

    let format = payload.audio_format.to_lowercase();
    if !audio::supported_formats().contains(&format.as_str()) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "Unsupported audio format. Supported: {:?}",
                audio::supported_formats()
            ))),
        ));
    }

    let language = payload.language;
    let audio_base64 = payload.audio_base64;

    // Decoding and analysis are CPU-bound; keep them off the async runtime.
    let result = tokio::task::spawn_blocking(move || -> Result<DetectionResult, AudioError> {
        let y = audio::decode_base64_audio(&audio_base64, &format)?;
        audio::validate_audio(&y, audio::TARGET_SAMPLE_RATE)?;
        Ok(VoiceDetector::new(&y, audio::TARGET_SAMPLE_RATE).detect())
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Detection task failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Internal server error")),
        )
    })?
    .map_err(|e| {
        let message = if e.is_validation() {
            e.to_string()
        } else {
            format!("Failed to decode audio: {e}")
        };
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
    })?;

    tracing::info!(
        language = language.as_str(),
        classification = result.classification.as_str(),
        confidence = result.confidence_score,
        "Voice detection completed"
    );

    Ok(Json(VoiceDetectionResponse {
        status: "success",
        language,
        classification: result.classification,
        confidence_score: result.confidence_score,
        explanation: result.explanation,
    }))
}
