// VK Telegram Bridge - Entry Point

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vk_tg_bridge::services::bridge::adapters::telegram::TelegramAdapter;
use vk_tg_bridge::services::bridge::adapters::vk::VkAdapter;
use vk_tg_bridge::services::bridge::adapters::ControlChannel;
use vk_tg_bridge::services::bridge::response_mapper::ResponseMapper;
use vk_tg_bridge::{AppResult, BridgeConfig, BridgeGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vk_tg_bridge=info")),
        )
        .init();

    let config = BridgeConfig::from_env()?;
    run(config).await?;
    Ok(())
}

async fn run(config: BridgeConfig) -> AppResult<()> {
    tracing::debug!(?config, "loaded configuration");

    let control = Arc::new(TelegramAdapter::new(config.telegram)?);
    let source = Arc::new(VkAdapter::new(config.vk)?);

    if let Err(e) = control.health_check().await {
        tracing::warn!("Telegram health check failed: {}", e);
    }

    let gateway = BridgeGateway::new(control, source, config.bridge);
    gateway.start().await?;
    tracing::info!("bridge running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    gateway.stop().await?;
    tracing::info!("{}", ResponseMapper::format_status(&gateway.get_status().await));
    Ok(())
}
