//! Channel Relay - translate-and-relay for Telegram channels
//!
//! Posts arriving on one source channel are translated into the language of
//! each destination channel and republished there. Attachments are copied
//! server-side with a translated caption. A failed translation degrades to
//! the original text; a failed delivery never affects other destinations.

#![forbid(unsafe_code)]

pub mod chat;
pub mod cli;
pub mod core;
pub mod relay;
pub mod server;
pub mod telegram;

// Re-export key types for convenience
pub use crate::core::{
    client::{LanguageModel, OpenAiClient},
    config::RelayConfig,
    errors::{RelayError, Result},
    models::{AttachmentKind, Content, Destination, DispatchResult, Post, RelayReport, TranslationOutcome},
};

pub use crate::relay::{
    dispatcher::{FanoutDispatcher, FeedPublisher},
    gate::SourceGate,
    pipeline::RelayPipeline,
    translation::TranslationService,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
