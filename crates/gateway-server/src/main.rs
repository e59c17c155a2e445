//! HTTP server for the market data gateway.

mod api;
mod config;
mod error;
mod scheduler;

use std::sync::Arc;

use api::app_router;
use config::{Config, LogFormat};
use gateway::MarketDataGateway;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let gateway = Arc::new(MarketDataGateway::yahoo(&config.gateway)?);
    scheduler::start_cache_sweeper(Arc::clone(&gateway), config.sweep_interval);

    let router = app_router(gateway);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
