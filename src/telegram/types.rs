//! Telegram Bot API wire types, reduced to the fields the relay reads

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::errors::{RelayError, Result};
use crate::core::models::{AttachmentKind, Post};

/// Envelope of every Bot API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
    pub migrate_to_chat_id: Option<i64>,
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Turn the envelope into the result or a typed error
    pub fn into_result(self) -> Result<T> {
        if self.ok {
            return self.result.ok_or_else(|| RelayError::InvalidResponseError {
                message: "Telegram response has no result".to_string(),
            });
        }

        let code = self.error_code.unwrap_or_default();
        let description = self.description.unwrap_or_else(|| "unknown error".to_string());

        if code == 429 {
            return Err(RelayError::RateLimitError {
                retry_after: self.parameters.and_then(|p| p.retry_after),
            });
        }

        Err(RelayError::TelegramError { code, description })
    }
}

/// Incoming update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

/// Bot identity returned by `getMe`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A message or channel post
///
/// Media payloads are kept opaque: the relay only needs to know which kind
/// is present, the bytes are copied server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Option<Chat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_note: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dice: Option<serde_json::Value>,
}

impl Message {
    pub fn chat_id(&self) -> i64 {
        self.chat.as_ref().map(|c| c.id).unwrap_or_default()
    }

    pub fn is_private(&self) -> bool {
        self.chat.as_ref().map(Chat::is_private).unwrap_or(false)
    }

    /// Which attachment the message carries
    pub fn attachment_kind(&self) -> AttachmentKind {
        // Telegram sends GIFs with both `animation` and `document`
        if self.animation.is_some() {
            AttachmentKind::Animation
        } else if self.photo.is_some() {
            AttachmentKind::Photo
        } else if self.video.is_some() {
            AttachmentKind::Video
        } else if self.document.is_some() {
            AttachmentKind::Document
        } else if self.audio.is_some() {
            AttachmentKind::Audio
        } else if self.voice.is_some() {
            AttachmentKind::Voice
        } else if self.sticker.is_some() {
            AttachmentKind::Sticker
        } else if self.video_note.is_some()
            || self.location.is_some()
            || self.contact.is_some()
            || self.poll.is_some()
            || self.venue.is_some()
            || self.dice.is_some()
        {
            AttachmentKind::Other
        } else {
            AttachmentKind::None
        }
    }

    /// Bot command at the start of the text, without the `@botname` suffix
    pub fn command(&self) -> Option<&str> {
        let text = self.text.as_deref()?.trim_start();
        let word = text.split_whitespace().next()?;
        let command = word.strip_prefix('/')?;
        Some(command.split('@').next().unwrap_or(command))
    }

    pub fn to_post(&self) -> Post {
        Post {
            feed_id: self.chat_id(),
            message_id: self.message_id,
            text: self.text.clone(),
            caption: self.caption.clone(),
            attachment: self.attachment_kind(),
        }
    }
}
