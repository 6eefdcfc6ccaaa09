use anyhow::{Result, Context};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

mod api;
mod chat;
mod config;
mod geo;
mod models;
mod probe;

use crate::api::AppState;
use crate::chat::OpenAiBot;
use crate::config::{AppConfig, Secrets};
use crate::geo::IpinfoClient;
use crate::probe::IcmpProber;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()))
        .with_ansi(true)
        .init();

    let config_path = "config.json";
    let config_content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path))?;
    let config: AppConfig = serde_json::from_str(&config_content)
        .with_context(|| "Failed to parse config")?;

    let secrets = Secrets::from_env();

    let state = Arc::new(AppState {
        prober: Arc::new(IcmpProber::new()?),
        geo: Arc::new(IpinfoClient::new(secrets.ipinfo_token)),
        bot: Arc::new(OpenAiBot::new(secrets.openai_api_key, config.chat_model.clone())),
        config,
    });

    let api_port = state.config.api_port;
    tokio::spawn(async move {
        api::start_server(api_port, state).await;
    });

    signal::ctrl_c().await?;
    info!("Shutdown signal received. Closing pingmap backend...");

    Ok(())
}
