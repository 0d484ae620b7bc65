//! Main entry point for the channel relay

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use channel_relay::cli::commands::{self, Commands};
use channel_relay::RelayConfig;

/// Channel relay - republish Telegram channel posts in several languages
#[derive(Parser, Debug)]
#[command(name = "channel-relay", version, about, long_about = None)]
struct Args {
    /// Config file (TOML, YAML or JSON); environment variables are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Telegram bot token (optional, defaults to TELEGRAM_TOKEN env var)
    #[arg(long, global = true)]
    bot_token: Option<String>,

    /// API key for the translation model (optional, defaults to OPENAI_API_KEY env var)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}={}", env!("CARGO_CRATE_NAME"), log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = RelayConfig::load(args.config.as_deref())?;

    // Override config with CLI args if provided
    if let Some(token) = args.bot_token {
        config.telegram.bot_token = token;
    }
    if let Some(api_key) = args.api_key {
        config.translation.api_key = api_key;
    }

    // Execute command
    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::handle_run(config).await?,
        Commands::Server { host, port } => commands::handle_server(config, host, port).await?,
        Commands::Translate { text, lang } => commands::handle_translate(config, text, lang).await?,
        Commands::Check => commands::handle_check(config).await?,
    }

    Ok(())
}
