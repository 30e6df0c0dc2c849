use anyhow::Context;
use dotenv::dotenv;
use tracing::info;

use microcourses_backend::{
    app::create_router,
    app_state::AppState,
    config,
    telemetry::{init_telemetry, TelemetryConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = config::init().context("Failed to load configuration")?;
    if config.is_production() && config.database.is_none() {
        anyhow::bail!("DATABASE_URL is required in production");
    }

    let telemetry = init_telemetry(Some(TelemetryConfig::for_app(config))).await?;

    let state = AppState::build(config.clone()).await?;
    let app = create_router(state);

    let addr = config.server_addr();
    info!(
        environment = config.app.environment.as_str(),
        "{} listening on {}", config.app.name, addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
