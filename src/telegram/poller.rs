//! Long-polling event source

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::TelegramConfig;
use crate::core::errors::{RelayError, Result};
use crate::telegram::client::TelegramClient;
use crate::telegram::router::UpdateRouter;
use crate::telegram::types::Update;

/// Where updates come from
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        self.get_updates(offset, timeout_secs).await
    }
}

/// Polls for updates and feeds them, in order, to the router
pub struct Poller<S> {
    source: S,
    router: UpdateRouter,
    timeout_secs: u64,
    retry_delay: Duration,
}

impl<S: UpdateSource> Poller<S> {
    pub fn new(source: S, router: UpdateRouter, config: &TelegramConfig) -> Self {
        Self {
            source,
            router,
            timeout_secs: config.poll_timeout_secs,
            retry_delay: Duration::from_millis(config.poll_retry_delay_ms),
        }
    }

    /// Poll until `shutdown` resolves
    ///
    /// A batch that has been fetched is always handled completely before the
    /// shutdown signal is checked again.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset: Option<i64> = None;

        info!("Polling for updates");

        loop {
            let retry = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down poller");
                    return Ok(());
                }
                fetched = self.source.fetch(offset, self.timeout_secs) => {
                    match fetched {
                        Ok(updates) => {
                            if !updates.is_empty() {
                                debug!("Received {} updates", updates.len());
                            }
                            offset = next_offset(offset, &updates);
                            for update in &updates {
                                self.router.handle(update).await;
                            }
                            None
                        }
                        Err(e) => {
                            let delay = match &e {
                                RelayError::RateLimitError { retry_after: Some(secs) } => {
                                    Duration::from_secs(*secs)
                                }
                                _ => self.retry_delay,
                            };
                            warn!("Polling failed: {}, retrying in {:?}", e, delay);
                            Some(delay)
                        }
                    }
                }
            };

            // A long rate-limit wait must not hold up shutdown
            if let Some(delay) = retry {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("Shutting down poller");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

/// Offset that acknowledges every update in the batch
pub fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .max(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::pipeline::RelayPipeline;
    use crate::relay::testing::{test_config, Delivery, FakeModel, FakePublisher, CHAN_EN, CHAN_TR, SOURCE};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Serves scripted batches, then nothing
    struct ScriptedSource {
        batches: Mutex<VecDeque<Result<Vec<Update>>>>,
        offsets: Mutex<Vec<Option<i64>>>,
    }

    impl ScriptedSource {
        fn new(batches: Vec<Result<Vec<Update>>>) -> Self {
            Self {
                batches: Mutex::new(batches.into()),
                offsets: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl UpdateSource for Arc<ScriptedSource> {
        async fn fetch(&self, offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<Update>> {
            self.offsets.lock().unwrap().push(offset);
            let next = self.batches.lock().unwrap().pop_front();
            match next {
                Some(batch) => batch,
                None => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn channel_post(update_id: i64, chat_id: i64, message_id: i64, text: &str) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": update_id,
            "channel_post": {
                "message_id": message_id,
                "chat": { "id": chat_id, "type": "channel" },
                "text": text
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(next_offset(None, &[]), None);
        assert_eq!(next_offset(Some(7), &[]), Some(7));

        let updates = vec![channel_post(5, SOURCE, 1, "a"), channel_post(9, SOURCE, 2, "b")];
        assert_eq!(next_offset(None, &updates), Some(10));
        assert_eq!(next_offset(Some(3), &updates), Some(10));
    }

    #[tokio::test]
    async fn test_poller_relays_in_order_and_survives_errors() {
        let config = test_config();
        let mut telegram = config.telegram.clone();
        telegram.poll_retry_delay_ms = 5;
        let config = Arc::new(config);

        let model = Arc::new(FakeModel::new());
        let publisher = Arc::new(FakePublisher::new());
        let pipeline = RelayPipeline::new(config.clone(), model, publisher.clone());
        let router = UpdateRouter::new(pipeline, None, SOURCE);

        let source = Arc::new(ScriptedSource::new(vec![
            Ok(vec![
                channel_post(5, SOURCE, 1, "یک"),
                channel_post(6, -1777, 2, "ignored"),
            ]),
            Err(RelayError::NetworkError {
                message: "connection reset".to_string(),
            }),
            Ok(vec![channel_post(7, SOURCE, 3, "دو")]),
        ]));

        let poller = Poller::new(source.clone(), router, &telegram);
        poller
            .run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        let offsets = source.offsets.lock().unwrap().clone();
        assert_eq!(&offsets[..4], &[None, Some(7), Some(7), Some(8)]);

        let english: Vec<Delivery> = publisher
            .deliveries()
            .into_iter()
            .filter(|d| matches!(d, Delivery::Text { feed_id, .. } if *feed_id == CHAN_EN))
            .collect();
        assert_eq!(
            english,
            vec![
                Delivery::text(CHAN_EN, "echo: یک"),
                Delivery::text(CHAN_EN, "echo: دو"),
            ]
        );
        assert_eq!(publisher.deliveries().len(), 4);
        assert!(publisher
            .deliveries()
            .contains(&Delivery::text(CHAN_TR, "echo: دو")));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_rate_limit_wait() {
        let config = test_config();
        let pipeline = RelayPipeline::new(
            Arc::new(config.clone()),
            Arc::new(FakeModel::new()),
            Arc::new(FakePublisher::new()),
        );
        let router = UpdateRouter::new(pipeline, None, SOURCE);

        let source = Arc::new(ScriptedSource::new(vec![Err(RelayError::RateLimitError {
            retry_after: Some(600),
        })]));

        let poller = Poller::new(source.clone(), router, &config.telegram);
        let stopped = tokio::time::timeout(
            Duration::from_secs(2),
            poller.run_until(tokio::time::sleep(Duration::from_millis(50))),
        )
        .await;

        assert!(matches!(stopped, Ok(Ok(()))));
        assert_eq!(source.offsets.lock().unwrap().len(), 1);
    }
}
