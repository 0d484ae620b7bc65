//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::core::errors::{RelayError, Result};
use crate::core::models::Destination;

/// Default instruction given to the model for every translation
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a professional translator. \
Translate the user's message from {source_language} into {target_language}. \
Keep the meaning faithful and the wording fluent and natural. \
Preserve emojis, hashtags, URLs and @mentions exactly as written. \
Return only the translation, with no commentary, notes or quotation marks.";

const DEFAULT_GREETING: &str = "سلام! من ربات هوش مصنوعی هستم 🤖";

const DEFAULT_ERROR_REPLY: &str = "Sorry, I can't answer right now. Please try again later.";

/// Telegram Bot API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base: String,
    pub poll_timeout_secs: u64,
    pub poll_retry_delay_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            poll_retry_delay_ms: 3000,
            request_timeout_ms: 15000,
        }
    }
}

/// Source feed and destinations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    pub source_feed_id: i64,
    pub destinations: Vec<Destination>,
    /// Language of the source feed, if known
    pub source_language: Option<String>,
}

/// Translation model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub system_instruction: String,
    pub temperature: f64,
    pub timeout_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            temperature: 0.2,
            timeout_ms: 30000,
        }
    }
}

/// Direct chat with the bot in private messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub enabled: bool,
    pub model: String,
    pub greeting: String,
    /// Sent when the model fails to answer
    pub error_reply: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gpt-3.5-turbo".to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            error_reply: DEFAULT_ERROR_REPLY.to_string(),
        }
    }
}

/// Webhook receiver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL Telegram should post updates to
    pub public_url: Option<String>,
    pub secret_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_url: None,
            secret_token: None,
        }
    }
}

/// Configuration for the relay, built once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub telegram: TelegramConfig,
    pub relay: RelaySettings,
    pub translation: TranslationConfig,
    pub chat: ChatConfig,
    pub server: ServerConfig,
}

impl RelayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, missing keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Load from a TOML, YAML or JSON file, with environment overrides on top
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with(path, |key| std::env::var(key).ok())
    }

    /// Load from a file, with overrides taken from `lookup`
    pub fn from_file_with<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let mut config: Self = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;

        config.apply_overrides(lookup)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from a file when given, otherwise from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(base) = lookup("TELEGRAM_API_BASE") {
            self.telegram.api_base = base;
        }
        if let Some(secs) = lookup("POLL_TIMEOUT_SECS") {
            self.telegram.poll_timeout_secs = parse_value("POLL_TIMEOUT_SECS", &secs)?;
        }
        if let Some(ms) = lookup("POLL_RETRY_DELAY_MS") {
            self.telegram.poll_retry_delay_ms = parse_value("POLL_RETRY_DELAY_MS", &ms)?;
        }
        if let Some(ms) = lookup("TELEGRAM_TIMEOUT_MS") {
            self.telegram.request_timeout_ms = parse_value("TELEGRAM_TIMEOUT_MS", &ms)?;
        }

        if let Some(id) = lookup("SOURCE_CHANNEL_ID") {
            self.relay.source_feed_id = parse_value("SOURCE_CHANNEL_ID", &id)?;
        }
        if let Some(list) = lookup("DESTINATIONS") {
            self.relay.destinations = parse_destinations(&list)?;
        }
        if let Some(lang) = lookup("SOURCE_LANGUAGE") {
            self.relay.source_language = Some(lang).filter(|l| !l.trim().is_empty());
        }

        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.translation.api_key = key;
        }
        if let Some(base) = lookup("OPENAI_API_BASE") {
            self.translation.api_base = base;
        }
        if let Some(model) = lookup("TRANSLATION_MODEL") {
            self.translation.model = model;
        }
        if let Some(instruction) = lookup("TRANSLATION_INSTRUCTION") {
            self.translation.system_instruction = instruction;
        }
        if let Some(temperature) = lookup("TRANSLATION_TEMPERATURE") {
            self.translation.temperature = parse_value("TRANSLATION_TEMPERATURE", &temperature)?;
        }
        if let Some(ms) = lookup("TRANSLATION_TIMEOUT_MS") {
            self.translation.timeout_ms = parse_value("TRANSLATION_TIMEOUT_MS", &ms)?;
        }

        if let Some(enabled) = lookup("CHAT_ENABLED") {
            self.chat.enabled = parse_value("CHAT_ENABLED", &enabled)?;
        }
        if let Some(model) = lookup("CHAT_MODEL") {
            self.chat.model = model;
        }
        if let Some(greeting) = lookup("CHAT_GREETING") {
            self.chat.greeting = greeting;
        }

        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = parse_value("SERVER_PORT", &port)?;
        }
        if let Some(url) = lookup("PUBLIC_URL") {
            self.server.public_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(secret) = lookup("WEBHOOK_SECRET") {
            self.server.secret_token = Some(secret).filter(|s| !s.is_empty());
        }

        Ok(())
    }

    /// Validate everything the relay needs to run
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            return Err(RelayError::config("Telegram bot token is required"));
        }

        if self.relay.source_feed_id == 0 {
            return Err(RelayError::config("Source channel id is required"));
        }

        if self.relay.destinations.is_empty() {
            return Err(RelayError::config("At least one destination is required"));
        }

        let mut seen = HashSet::new();
        for destination in &self.relay.destinations {
            if destination.language.trim().is_empty() {
                return Err(RelayError::config(format!(
                    "Destination {} has no target language",
                    destination.feed_id
                )));
            }
            if destination.feed_id == self.relay.source_feed_id {
                return Err(RelayError::config(format!(
                    "Destination {} is the source channel",
                    destination.feed_id
                )));
            }
            if !destination.is_enabled() {
                warn!("Destination for {} has no channel id and will be skipped", destination.language);
            } else if !seen.insert(destination.feed_id) {
                return Err(RelayError::config(format!(
                    "Destination {} is listed more than once",
                    destination.feed_id
                )));
            }
        }

        if self.enabled_destinations().next().is_none() {
            return Err(RelayError::config("All destinations are unset"));
        }

        self.validate_translation()
    }

    /// Validate only the translation settings
    pub fn validate_translation(&self) -> Result<()> {
        if self.translation.api_key.is_empty() {
            return Err(RelayError::config("Translation API key is required"));
        }

        if self.translation.api_base.is_empty() {
            return Err(RelayError::config("Translation API base URL is required"));
        }

        if self.translation.model.is_empty() {
            return Err(RelayError::config("Translation model is required"));
        }

        if self.translation.system_instruction.trim().is_empty() {
            return Err(RelayError::config("Translation instruction must not be empty"));
        }

        if !(0.0..=2.0).contains(&self.translation.temperature) {
            return Err(RelayError::config("temperature must be between 0 and 2"));
        }

        if self.translation.timeout_ms == 0 {
            return Err(RelayError::config("timeout_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Destinations with a channel id set
    pub fn enabled_destinations(&self) -> impl Iterator<Item = &Destination> {
        self.relay.destinations.iter().filter(|d| d.is_enabled())
    }

    /// Instruction for one target language
    pub fn render_instruction(&self, target_language: &str) -> String {
        let source = self
            .relay
            .source_language
            .as_deref()
            .unwrap_or("the source language");

        let template = &self.translation.system_instruction;
        let mut instruction = template
            .replace("{source_language}", source)
            .replace("{target_language}", target_language);

        if !template.contains("{target_language}") {
            instruction.push_str(&format!("\nTarget language: {}", target_language));
        }

        instruction
    }
}

/// Parse `id:Language` pairs separated by commas
pub fn parse_destinations(list: &str) -> Result<Vec<Destination>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, language) = entry.split_once(':').ok_or_else(|| {
                RelayError::config(format!("Destination '{}' must look like id:Language", entry))
            })?;

            let id = id.trim();
            let feed_id = if id.is_empty() {
                0
            } else {
                parse_value("DESTINATIONS", id)?
            };

            Ok(Destination::new(feed_id, language.trim()))
        })
        .collect()
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| RelayError::config(format!("{} has an invalid value: '{}'", key, value)))
}
