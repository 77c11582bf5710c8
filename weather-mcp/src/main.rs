//! `weather-mcp`: MCP server exposing `get_weather` over stdio.

use anyhow::Context;
use rmcp::ServiceExt;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use weather_core::{Config, provider_from_config};

mod server;

use server::WeatherServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?.with_env_overrides();
    let provider = provider_from_config(&config)?;

    tracing::info!("Starting weather MCP server on stdio");

    let service = WeatherServer::new(Arc::from(provider))
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP service")?;

    service.waiting().await?;

    tracing::info!("Weather MCP server stopped");
    Ok(())
}
