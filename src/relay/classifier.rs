//! Content classification

use crate::core::models::{Content, Post};

/// Resolve the shape of a post
///
/// Attachments always classify as [`Content::Media`], with an empty caption
/// when the post has none. Without an attachment the post is [`Content::Text`]
/// if it carries non-blank text or caption, otherwise [`Content::Empty`].
pub fn classify(post: &Post) -> Content {
    let payload = post.payload();

    if post.attachment.is_present() {
        return Content::Media {
            kind: post.attachment,
            caption: payload.unwrap_or_default().to_string(),
        };
    }

    match payload {
        Some(text) => Content::Text(text.to_string()),
        None => Content::Empty,
    }
}
