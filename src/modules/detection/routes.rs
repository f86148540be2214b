use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::modules::detection::controller;
use crate::AppState;

/// Five minutes of base64 mp3 fits comfortably; the axum default of 2 MB
/// does not.
const AUDIO_UPLOAD_LIMIT_BYTES: usize = 32 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/voice-detection",
        post(controller::detect_voice).layer(DefaultBodyLimit::max(AUDIO_UPLOAD_LIMIT_BYTES)),
    )
}
