//! In-memory fakes for the model and the publisher

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::client::LanguageModel;
use crate::core::config::RelayConfig;
use crate::core::errors::{RelayError, Result};
use crate::core::models::Destination;
use crate::relay::dispatcher::FeedPublisher;

pub const SOURCE: i64 = -1001;
pub const CHAN_EN: i64 = -1002;
pub const CHAN_TR: i64 = -1003;

/// Valid config relaying `SOURCE` to English and Turkish channels
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.telegram.bot_token = "123:abc".to_string();
    config.translation.api_key = "sk-test".to_string();
    config.relay.source_feed_id = SOURCE;
    config.relay.destinations = vec![
        Destination::new(CHAN_EN, "English"),
        Destination::new(CHAN_TR, "Turkish"),
    ];
    config
}

#[derive(Debug, Clone)]
enum Behavior {
    Reply(String),
    Fail,
    Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCall {
    pub system: Option<String>,
    pub user: String,
}

/// Model that answers per target language and records every call
#[derive(Debug, Default)]
pub struct FakeModel {
    rules: Vec<(String, Behavior)>,
    calls: Mutex<Vec<ModelCall>>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, language: &str, answer: &str) -> Self {
        self.rules
            .push((language.to_string(), Behavior::Reply(answer.to_string())));
        self
    }

    pub fn fail(mut self, language: &str) -> Self {
        self.rules.push((language.to_string(), Behavior::Fail));
        self
    }

    pub fn hang(mut self, language: &str) -> Self {
        self.rules.push((language.to_string(), Behavior::Hang));
        self
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }

    fn behavior(&self, system: Option<&str>) -> Option<Behavior> {
        let system = system?;
        self.rules
            .iter()
            .find(|(language, _)| system.contains(&format!("into {}", language)))
            .map(|(_, behavior)| behavior.clone())
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, system: Option<&str>, user: &str) -> Result<String> {
        self.calls.lock().unwrap().push(ModelCall {
            system: system.map(str::to_string),
            user: user.to_string(),
        });

        match self.behavior(system) {
            Some(Behavior::Reply(answer)) => Ok(answer),
            Some(Behavior::Fail) => Err(RelayError::TimeoutError { timeout_ms: 30000 }),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(RelayError::TimeoutError { timeout_ms: 30000 })
            }
            None => Ok(format!("echo: {}", user)),
        }
    }
}

/// One outbound action seen by [`FakePublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Text {
        feed_id: i64,
        text: String,
    },
    Copy {
        from: i64,
        message_id: i64,
        to: i64,
        caption: Option<String>,
    },
    Reply {
        chat_id: i64,
        reply_to: i64,
        text: String,
    },
}

impl Delivery {
    pub fn text(feed_id: i64, text: &str) -> Self {
        Delivery::Text {
            feed_id,
            text: text.to_string(),
        }
    }

    pub fn copy(from: i64, message_id: i64, to: i64, caption: Option<&str>) -> Self {
        Delivery::Copy {
            from,
            message_id,
            to,
            caption: caption.map(str::to_string),
        }
    }

    pub fn reply(chat_id: i64, reply_to: i64, text: &str) -> Self {
        Delivery::Reply {
            chat_id,
            reply_to,
            text: text.to_string(),
        }
    }

    fn target(&self) -> i64 {
        match self {
            Delivery::Text { feed_id, .. } => *feed_id,
            Delivery::Copy { to, .. } => *to,
            Delivery::Reply { chat_id, .. } => *chat_id,
        }
    }
}

/// Publisher that records deliveries and fails for selected feeds
#[derive(Debug, Default)]
pub struct FakePublisher {
    failing: HashSet<i64>,
    attempts: Mutex<Vec<Delivery>>,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, feed_id: i64) -> Self {
        self.failing.insert(feed_id);
        self
    }

    /// Every action attempted, including failed ones
    pub fn attempts(&self) -> Vec<Delivery> {
        self.attempts.lock().unwrap().clone()
    }

    /// Actions that succeeded
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.attempts()
            .into_iter()
            .filter(|d| !self.failing.contains(&d.target()))
            .collect()
    }

    fn record(&self, delivery: Delivery) -> Result<()> {
        let target = delivery.target();
        self.attempts.lock().unwrap().push(delivery);

        if self.failing.contains(&target) {
            return Err(RelayError::TelegramError {
                code: 403,
                description: "Forbidden: bot is not a member of the channel chat".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FeedPublisher for FakePublisher {
    async fn send_text(&self, feed_id: i64, text: &str) -> Result<()> {
        self.record(Delivery::text(feed_id, text))
    }

    async fn copy_attachment(
        &self,
        source_feed_id: i64,
        message_id: i64,
        dest_feed_id: i64,
        caption: Option<&str>,
    ) -> Result<()> {
        self.record(Delivery::copy(source_feed_id, message_id, dest_feed_id, caption))
    }

    async fn reply_text(&self, chat_id: i64, reply_to_message_id: i64, text: &str) -> Result<()> {
        self.record(Delivery::reply(chat_id, reply_to_message_id, text))
    }
}
