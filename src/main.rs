use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use voiceguard::config::settings::Settings;
use voiceguard::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("voiceguard=info".parse()?))
        .with_target(false)
        .init();

    let settings = Settings::from_env();
    let addr = settings.bind_addr();

    let state = AppState { settings };
    let router = app(state);

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
