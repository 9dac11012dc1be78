//! Notification aggregation engine.
//!
//! Groups episode "item added" events per series season and flushes each
//! group once its sliding debounce window elapses. Movies, unkeyable
//! episodes, and everything under a zero delay dispatch immediately.
//! `shutdown` force-flushes whatever is still pending so buffered events
//! are never dropped on process exit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use notifex_model::{AggregationKey, MediaAddedEvent};

use crate::error::Result;

/// Finalized payload handed to the flush sink: an ordered, non-empty
/// sequence of events sharing one aggregation key (`None` for immediate
/// single-event dispatch).
#[derive(Debug, Clone)]
pub struct NotificationBatch {
    pub key: Option<AggregationKey>,
    pub events: Vec<MediaAddedEvent>,
}

impl NotificationBatch {
    pub fn is_single(&self) -> bool {
        self.events.len() == 1
    }
}

/// Downstream collaborator that renders and delivers a finalized batch.
///
/// Delivery errors are the sink's own concern; the engine logs them and
/// moves on without retrying.
#[async_trait]
pub trait FlushSink: Send + Sync {
    async fn deliver(&self, batch: NotificationBatch) -> Result<()>;
}

/// Events accumulated for one aggregation key, plus the armed flush timer.
struct PendingGroup {
    events: Vec<MediaAddedEvent>,
    created_at: Instant,
    last_arrival: Instant,
    /// Exactly one outstanding scheduled flush at any time
    timer: JoinHandle<()>,
}

struct Inner {
    delay: Duration,
    sink: Arc<dyn FlushSink>,
    /// Sole shared mutable state: at most one live group per key
    groups: Mutex<HashMap<AggregationKey, PendingGroup>>,
}

/// The aggregation engine. Cheap to clone via `Arc` in app state.
pub struct Aggregator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("delay", &self.inner.delay)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    pub fn new(delay: Duration, sink: Arc<dyn FlushSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay,
                sink,
                groups: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Accept one normalized event. Never fails and never blocks on
    /// delivery; timer firing and dispatch happen asynchronously.
    pub async fn submit(&self, event: MediaAddedEvent) {
        let key = AggregationKey::derive(&event);

        let Some(key) = key.filter(|_| !self.inner.delay.is_zero()) else {
            // Movies and unkeyable episodes dispatch immediately, as does
            // everything when aggregation is disabled.
            let batch = NotificationBatch {
                key: AggregationKey::derive(&event),
                events: vec![event],
            };
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                Inner::dispatch(&inner, batch).await;
            });
            return;
        };

        let mut groups = self.inner.groups.lock().await;
        match groups.get_mut(&key) {
            Some(group) => {
                // Sliding window: cancel the armed timer before arming a
                // replacement so two timers never coexist for one group.
                group.timer.abort();
                group.events.push(event);
                group.last_arrival = Instant::now();
                group.timer = Inner::arm_timer(&self.inner, key.clone());
                debug!(key = %key, pending = group.events.len(), "rescheduled aggregation window");
            }
            None => {
                let now = Instant::now();
                let timer = Inner::arm_timer(&self.inner, key.clone());
                groups.insert(
                    key.clone(),
                    PendingGroup {
                        events: vec![event],
                        created_at: now,
                        last_arrival: now,
                        timer,
                    },
                );
                debug!(key = %key, delay = ?self.inner.delay, "opened aggregation window");
            }
        }
    }

    /// Force-flush every pending group, oldest first. Idempotent; safe
    /// with zero pending groups. Waits for each forced dispatch before
    /// returning so no buffered event is silently dropped at exit.
    pub async fn shutdown(&self) {
        let mut drained: Vec<(AggregationKey, PendingGroup)> = {
            let mut groups = self.inner.groups.lock().await;
            let drained: Vec<_> = groups.drain().collect();
            // Cancel timers while still holding the lock: a timer mid-fire
            // is either aborted here or finds its key already gone.
            for (_, group) in &drained {
                group.timer.abort();
            }
            drained
        };

        if drained.is_empty() {
            return;
        }

        drained.sort_by_key(|(_, group)| group.created_at);
        info!(groups = drained.len(), "flushing pending notifications before shutdown");

        for (key, group) in drained {
            let batch = NotificationBatch {
                key: Some(key),
                events: group.events,
            };
            Inner::dispatch(&self.inner, batch).await;
        }
    }

    /// Number of live pending groups (diagnostics and tests)
    pub async fn pending_groups(&self) -> usize {
        self.inner.groups.lock().await.len()
    }
}

impl Inner {
    fn arm_timer(inner: &Arc<Inner>, key: AggregationKey) -> JoinHandle<()> {
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            Inner::flush(&inner, &key).await;
        })
    }

    /// Remove the group for `key` and hand its events to the sink.
    ///
    /// A missing key is a no-op: the group was already claimed by a
    /// competing timer fire or a shutdown-triggered forced flush, and a
    /// group instance must never reach the sink twice.
    async fn flush(inner: &Arc<Inner>, key: &AggregationKey) {
        let group = inner.groups.lock().await.remove(key);
        let Some(group) = group else {
            return;
        };

        debug!(
            key = %key,
            events = group.events.len(),
            idle = ?group.last_arrival.elapsed(),
            "aggregation window elapsed"
        );
        let batch = NotificationBatch {
            key: Some(key.clone()),
            events: group.events,
        };
        Inner::dispatch(inner, batch).await;
    }

    /// Sink call happens outside the map lock; a failed delivery does not
    /// resurrect the group.
    async fn dispatch(inner: &Arc<Inner>, batch: NotificationBatch) {
        let events = batch.events.len();
        if let Err(error) = inner.sink.deliver(batch).await {
            warn!(%error, events, "notification delivery failed");
        }
    }
}
