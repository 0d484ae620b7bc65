//! Core data models for the relay

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of non-text payload attached to a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Plain text post
    #[default]
    None,
    Photo,
    Video,
    Document,
    Animation,
    Audio,
    Voice,
    Sticker,
    /// Anything else Telegram can attach (video notes, polls, locations...)
    Other,
}

impl AttachmentKind {
    /// Whether the post carries an attachment at all
    pub fn is_present(&self) -> bool {
        !matches!(self, AttachmentKind::None)
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttachmentKind::None => "none",
            AttachmentKind::Photo => "photo",
            AttachmentKind::Video => "video",
            AttachmentKind::Document => "document",
            AttachmentKind::Animation => "animation",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Voice => "voice",
            AttachmentKind::Sticker => "sticker",
            AttachmentKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// A post received from a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub feed_id: i64,
    pub message_id: i64,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub attachment: AttachmentKind,
}

impl Post {
    /// Create a text post
    pub fn text(feed_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            feed_id,
            message_id,
            text: Some(text.into()),
            caption: None,
            attachment: AttachmentKind::None,
        }
    }

    /// Create a post with an attachment and optional caption
    pub fn media(
        feed_id: i64,
        message_id: i64,
        attachment: AttachmentKind,
        caption: Option<String>,
    ) -> Self {
        Self {
            feed_id,
            message_id,
            text: None,
            caption,
            attachment,
        }
    }

    /// Textual payload: the text, or the caption when there is no text
    pub fn payload(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.caption.as_deref().filter(|c| !c.trim().is_empty()))
    }
}

/// A destination feed and the language its content is translated into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub feed_id: i64,
    pub language: String,
}

impl Destination {
    pub fn new(feed_id: i64, language: impl Into<String>) -> Self {
        Self {
            feed_id,
            language: language.into(),
        }
    }

    /// A zero feed id means the destination was left unset
    pub fn is_enabled(&self) -> bool {
        self.feed_id != 0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.feed_id, self.language)
    }
}

/// Shape of a post, resolved once by the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Text without attachment
    Text(String),
    /// Attachment with a caption, possibly empty
    Media {
        kind: AttachmentKind,
        caption: String,
    },
    /// Nothing to relay
    Empty,
}

impl Content {
    /// Text that has to be translated for each destination
    pub fn translatable(&self) -> &str {
        match self {
            Content::Text(text) => text,
            Content::Media { caption, .. } => caption,
            Content::Empty => "",
        }
    }
}

/// Result of translating one text into one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Translated text, or the original when `success` is false
    pub text: String,
    pub success: bool,
    pub original: String,
}

impl TranslationOutcome {
    pub fn translated(original: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
            original: original.into(),
        }
    }

    pub fn fallback(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            text: original.clone(),
            success: false,
            original,
        }
    }

    /// Text to publish
    pub fn effective_text(&self) -> &str {
        if self.success {
            &self.text
        } else {
            &self.original
        }
    }
}

/// What happened for one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Delivered,
    Skipped(String),
    Failed(String),
}

/// Per-destination delivery record, used for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub feed_id: i64,
    pub language: String,
    pub status: DispatchStatus,
    /// Whether the delivered content was translated or fell back to the original
    pub translated: bool,
}

impl DispatchResult {
    pub fn is_delivered(&self) -> bool {
        self.status == DispatchStatus::Delivered
    }
}

/// Why a post was not relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    ForeignFeed,
    Empty,
}

/// Outcome of running one post through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayReport {
    Dropped(DropReason),
    Relayed(Vec<DispatchResult>),
}

impl RelayReport {
    /// Number of destinations that received the post
    pub fn delivered(&self) -> usize {
        match self {
            RelayReport::Dropped(_) => 0,
            RelayReport::Relayed(results) => results.iter().filter(|r| r.is_delivered()).count(),
        }
    }
}
