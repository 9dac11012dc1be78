//! Production flush sink: enrich, render, deliver.

use async_trait::async_trait;
use tracing::debug;

use crate::aggregator::{FlushSink, NotificationBatch};
use crate::error::{NotifyError, Result};
use crate::providers::tmdb::{TmdbEnrichment, TmdbProvider};
use crate::render;
use crate::telegram::TelegramClient;

/// Renders a finalized batch and posts it to Telegram, with optional TMDB
/// enrichment for poster and synopsis.
#[derive(Debug)]
pub struct NotificationSink {
    telegram: TelegramClient,
    tmdb: Option<TmdbProvider>,
}

impl NotificationSink {
    pub fn new(telegram: TelegramClient, tmdb: Option<TmdbProvider>) -> Self {
        Self { telegram, tmdb }
    }
}

#[async_trait]
impl FlushSink for NotificationSink {
    async fn deliver(&self, batch: NotificationBatch) -> Result<()> {
        let Some(first) = batch.events.first() else {
            return Err(NotifyError::InvalidPayload("empty batch".to_string()));
        };

        // The first event carries the shared series/movie identity, so one
        // lookup covers the whole batch.
        let enrichment = match &self.tmdb {
            Some(provider) => provider.enrich(first).await,
            None => TmdbEnrichment::default(),
        };

        let message = render::render_batch(&batch.events, Some(&enrichment));
        debug!(
            events = batch.events.len(),
            has_poster = enrichment.poster_url.is_some(),
            "delivering notification"
        );

        match enrichment.poster_url.as_deref() {
            Some(poster_url) => {
                self.telegram
                    .send_photo(&message.title, &message.body, poster_url)
                    .await
            }
            None => self.telegram.send_message(&message.title, &message.body).await,
        }
    }
}
