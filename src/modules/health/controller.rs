use axum::Json;

use crate::modules::detection::schema::Language;
use crate::modules::health::schema::{HealthStatus, ServiceInfo};

pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "healthy",
        service: "AI Voice Detection API",
        version: env!("CARGO_PKG_VERSION"),
        supported_languages: Language::all().iter().map(|l| l.as_str()).collect(),
    })
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}
