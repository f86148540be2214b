use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod middleware;
pub mod modules;
pub mod services;

use config::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
}

/// Build the service router. Health endpoints are public; detection requires
/// an API key.
pub fn app(state: AppState) -> Router {
    let protected = modules::detection::routes::routes().layer(from_fn_with_state(
        state.clone(),
        middleware::auth::require_api_key,
    ));

    modules::health::routes::routes()
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
