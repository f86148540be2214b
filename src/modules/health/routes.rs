use axum::{routing::get, Router};

use crate::modules::health::controller;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(controller::service_info))
        .route("/health", get(controller::health))
}
