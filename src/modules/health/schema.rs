use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub supported_languages: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}
