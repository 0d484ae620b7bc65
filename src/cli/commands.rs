//! CLI command definitions and handlers

use clap::Subcommand;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chat::ChatResponder;
use crate::core::client::OpenAiClient;
use crate::core::config::RelayConfig;
use crate::relay::pipeline::RelayPipeline;
use crate::relay::translation::TranslationService;
use crate::telegram::{Poller, TelegramClient, UpdateRouter};

/// Commands for the channel relay
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relay posts using long polling (default)
    Run,

    /// Receive updates through a webhook instead of polling
    Server {
        /// Bind address (default: from config, 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (default: from config, 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Translate a text once, exactly as the relay would
    Translate {
        /// Text to translate
        #[arg(short, long)]
        text: String,

        /// Target language, e.g. English
        #[arg(short, long)]
        lang: String,
    },

    /// Validate the configuration and the bot token
    Check,
}

/// Wire the relay and, when enabled, the chat responder
pub fn build_router(config: Arc<RelayConfig>, telegram: &TelegramClient) -> anyhow::Result<UpdateRouter> {
    let model = Arc::new(OpenAiClient::for_translation(&config.translation)?);
    let publisher = Arc::new(telegram.clone());

    let chat = if config.chat.enabled {
        let chat_model = Arc::new(OpenAiClient::for_chat(&config.translation, &config.chat)?);
        Some(ChatResponder::new(&config.chat, chat_model, publisher.clone()))
    } else {
        None
    };

    let pipeline = RelayPipeline::new(config.clone(), model, publisher);
    Ok(UpdateRouter::new(pipeline, chat, config.relay.source_feed_id))
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn log_destinations(config: &RelayConfig) {
    info!("Source channel: {}", config.relay.source_feed_id);
    for destination in config.enabled_destinations() {
        info!("Destination: {}", destination);
    }
    info!("Translation model: {}", config.translation.model);
}

/// Handle run command
pub async fn handle_run(config: RelayConfig) -> anyhow::Result<()> {
    config.validate()?;
    log_destinations(&config);

    let config = Arc::new(config);
    let telegram = TelegramClient::new(&config.telegram)?;
    let router = build_router(config.clone(), &telegram)?;

    telegram.delete_webhook().await?;

    let poller = Poller::new(telegram, router, &config.telegram);
    poller.run_until(shutdown_signal()).await?;

    Ok(())
}

/// Handle server command
pub async fn handle_server(
    mut config: RelayConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    config.validate()?;
    log_destinations(&config);

    let config = Arc::new(config);
    let telegram = TelegramClient::new(&config.telegram)?;
    let router = build_router(config.clone(), &telegram)?;

    println!(
        "🚀 Webhook server starting on http://{}:{}",
        config.server.host, config.server.port
    );

    run_server(&config.server, &telegram, router, shutdown_signal()).await?;

    Ok(())
}

/// Handle translate command
pub async fn handle_translate(config: RelayConfig, text: String, lang: String) -> anyhow::Result<()> {
    config.validate_translation()?;

    let config = Arc::new(config);
    let model = Arc::new(OpenAiClient::for_translation(&config.translation)?);
    let service = TranslationService::new(model, config);

    let outcome = service.translate(&text, &lang).await;

    if outcome.success {
        println!("✅ {}", outcome.text);
    } else {
        println!("⚠️  Translation failed, the relay would send the original:");
        println!("   {}", outcome.text);
    }

    Ok(())
}

/// Handle check command
pub async fn handle_check(config: RelayConfig) -> anyhow::Result<()> {
    config.validate()?;

    let telegram = TelegramClient::new(&config.telegram)?;
    let me = telegram.get_me().await?;

    println!(
        "✅ Bot: {} (@{})",
        me.first_name,
        me.username.as_deref().unwrap_or("-")
    );
    println!("   Source channel: {}", config.relay.source_feed_id);
    for destination in &config.relay.destinations {
        if destination.is_enabled() {
            println!("   → {}", destination);
        } else {
            println!("   → {} (unset, skipped)", destination.language);
        }
    }
    println!("   Model: {}", config.translation.model);
    println!(
        "   Chat: {}",
        if config.chat.enabled { "enabled" } else { "disabled" }
    );

    Ok(())
}
