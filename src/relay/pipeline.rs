//! Relay pipeline: gate, classify, translate and fan out

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::client::LanguageModel;
use crate::core::config::RelayConfig;
use crate::core::models::{
    Content, Destination, DispatchResult, DropReason, Post, RelayReport, TranslationOutcome,
};
use crate::relay::classifier::classify;
use crate::relay::dispatcher::{FanoutDispatcher, FeedPublisher};
use crate::relay::gate::SourceGate;
use crate::relay::translation::TranslationService;

/// Runs each incoming post through the relay
#[derive(Clone)]
pub struct RelayPipeline {
    config: Arc<RelayConfig>,
    gate: SourceGate,
    translator: TranslationService,
    dispatcher: FanoutDispatcher,
}

impl RelayPipeline {
    pub fn new(
        config: Arc<RelayConfig>,
        model: Arc<dyn LanguageModel>,
        publisher: Arc<dyn FeedPublisher>,
    ) -> Self {
        Self {
            gate: SourceGate::new(config.relay.source_feed_id),
            translator: TranslationService::new(model, config.clone()),
            dispatcher: FanoutDispatcher::new(publisher),
            config,
        }
    }

    pub fn translator(&self) -> &TranslationService {
        &self.translator
    }

    /// Process one post
    ///
    /// Destinations are handled concurrently; each one's delivery waits only
    /// for its own translation.
    pub async fn process(&self, post: &Post) -> RelayReport {
        if !self.gate.admit(post) {
            return RelayReport::Dropped(DropReason::ForeignFeed);
        }

        let content = classify(post);
        if content == Content::Empty {
            debug!(message_id = post.message_id, "Ignoring empty post");
            return RelayReport::Dropped(DropReason::Empty);
        }

        let results = join_all(
            self.config
                .relay
                .destinations
                .iter()
                .map(|destination| self.relay_to(post, &content, destination)),
        )
        .await;

        let delivered = results.iter().filter(|r| r.is_delivered()).count();
        info!(
            message_id = post.message_id,
            attachment = %post.attachment,
            "Post relayed to {}/{} destinations",
            delivered,
            results.len()
        );

        RelayReport::Relayed(results)
    }

    async fn relay_to(&self, post: &Post, content: &Content, destination: &Destination) -> DispatchResult {
        // Unset destinations never cost a translation call
        let outcome = if destination.is_enabled() {
            self.translator
                .translate(content.translatable(), &destination.language)
                .await
        } else {
            TranslationOutcome::translated("", "")
        };

        self.dispatcher
            .dispatch_one(post, content, destination, &outcome)
            .await
    }
}
