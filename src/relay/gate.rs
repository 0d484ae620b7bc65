//! Source feed admission

use crate::core::models::Post;

/// Admits posts from the configured source feed only
#[derive(Debug, Clone, Copy)]
pub struct SourceGate {
    source_feed_id: i64,
}

impl SourceGate {
    pub fn new(source_feed_id: i64) -> Self {
        Self { source_feed_id }
    }

    pub fn admit(&self, post: &Post) -> bool {
        post.feed_id == self.source_feed_id
    }

    pub fn source_feed_id(&self) -> i64 {
        self.source_feed_id
    }
}
