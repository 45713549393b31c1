mod api;
mod auth;
mod bootstrap;
mod health;

use anyhow::Context;
use sheetwise_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn wait_for_shutdown() {
    // Serve until ctrl-c; a signal-handler failure just means no
    // graceful shutdown, not a crash.
    let _ = tokio::signal::ctrl_c().await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(LoadOptions::default()).context("loading configuration")?;
    init_logging(&config);

    let application = bootstrap::build(config)?;
    let address = format!(
        "{}:{}",
        application.config.server.bind_address, application.config.server.port
    );

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(address = %address, provider = %application.provider, "sheetwise-server listening");

    axum::serve(listener, application.router)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("serving http")?;

    info!("sheetwise-server stopped");
    Ok(())
}
