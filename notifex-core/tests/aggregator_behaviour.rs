//! Behavioural tests for the aggregation engine: grouping, debounce
//! rescheduling, immediate dispatch, and shutdown flushing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::sleep;

use notifex_core::aggregator::{Aggregator, FlushSink, NotificationBatch};
use notifex_core::error::NotifyError;
use notifex_model::{
    EpisodeNumber, MediaAddedEvent, MediaKind, ProviderIds, SeasonNumber, VideoQuality,
};

// Scaled-down aggregation window; generous margins keep these stable on
// loaded CI machines.
const DELAY: Duration = Duration::from_millis(200);

#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<NotificationBatch>>,
}

impl RecordingSink {
    fn batches(&self) -> Vec<NotificationBatch> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl FlushSink for RecordingSink {
    async fn deliver(&self, batch: NotificationBatch) -> Result<(), NotifyError> {
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl FlushSink for FailingSink {
    async fn deliver(&self, _batch: NotificationBatch) -> Result<(), NotifyError> {
        Err(NotifyError::Telegram("boom".to_string()))
    }
}

fn episode(series: &str, season: u16, number: u16) -> MediaAddedEvent {
    MediaAddedEvent {
        kind: MediaKind::Episode,
        title: format!("Episode {number}"),
        series_name: Some(series.to_string()),
        series_id: Some(format!("{series}-id")),
        season_id: Some(format!("{series}-s{season}")),
        season_number: Some(SeasonNumber::new(season)),
        episode_number: Some(EpisodeNumber::new(number)),
        season_name: None,
        production_year: None,
        rating: None,
        genres: Vec::new(),
        quality: VideoQuality::default(),
        file_count: 1,
        file_size_bytes: 0,
        provider_ids: ProviderIds::default(),
        overview: None,
        item_id: None,
        primary_image_tag: None,
        received_at: Utc::now(),
    }
}

fn movie(title: &str) -> MediaAddedEvent {
    MediaAddedEvent {
        kind: MediaKind::Movie,
        title: title.to_string(),
        series_name: None,
        series_id: None,
        season_id: None,
        season_number: None,
        episode_number: None,
        season_name: None,
        production_year: None,
        rating: None,
        genres: Vec::new(),
        quality: VideoQuality::default(),
        file_count: 1,
        file_size_bytes: 0,
        provider_ids: ProviderIds::default(),
        overview: None,
        item_id: None,
        primary_image_tag: None,
        received_at: Utc::now(),
    }
}

fn episode_numbers(batch: &NotificationBatch) -> Vec<u16> {
    batch
        .events
        .iter()
        .filter_map(|event| event.episode_number.map(|n| n.value()))
        .collect()
}

// Scenario A / P1: events inside the window collapse into one ordered batch
#[tokio::test]
async fn burst_of_episodes_flushes_as_one_ordered_batch() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(DELAY, sink.clone());

    for number in 1..=5 {
        aggregator.submit(episode("X", 1, number)).await;
        sleep(Duration::from_millis(20)).await;
    }

    sleep(DELAY + Duration::from_millis(200)).await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(episode_numbers(&batches[0]), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        batches[0].events.iter().map(|e| e.file_count).sum::<u32>(),
        5
    );
    assert_eq!(aggregator.pending_groups().await, 0);
}

// P2: each arrival slides the window; nothing flushes early
#[tokio::test]
async fn window_slides_on_each_arrival() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(DELAY, sink.clone());

    aggregator.submit(episode("X", 1, 1)).await;
    sleep(DELAY / 2).await;
    assert!(sink.batches().is_empty(), "flushed before the window elapsed");

    aggregator.submit(episode("X", 1, 2)).await;
    sleep(DELAY / 2).await;
    // Half the original window has passed twice over, but the second
    // arrival reset the timer.
    assert!(sink.batches().is_empty(), "reschedule did not slide the window");

    sleep(DELAY).await;
    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(episode_numbers(&batches[0]), vec![1, 2]);
}

// Scenario B / P3: movies bypass aggregation regardless of the delay
#[tokio::test]
async fn movies_dispatch_immediately() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(Duration::from_secs(10), sink.clone());

    aggregator.submit(movie("Inception")).await;
    sleep(Duration::from_millis(50)).await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert!(batches[0].is_single());
    assert!(batches[0].key.is_none());
    assert_eq!(aggregator.pending_groups().await, 0);
}

// P4: zero delay disables grouping for everything
#[tokio::test]
async fn zero_delay_bypasses_grouping() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(Duration::ZERO, sink.clone());

    aggregator.submit(episode("X", 1, 1)).await;
    aggregator.submit(episode("X", 1, 2)).await;
    aggregator.submit(movie("Inception")).await;
    sleep(Duration::from_millis(50)).await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(NotificationBatch::is_single));
    assert_eq!(aggregator.pending_groups().await, 0);
}

// Scenario C: a gap longer than the window starts a fresh cycle
#[tokio::test]
async fn gap_longer_than_window_splits_batches() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(DELAY, sink.clone());

    aggregator.submit(episode("X", 1, 1)).await;
    sleep(DELAY + Duration::from_millis(100)).await;
    aggregator.submit(episode("X", 1, 2)).await;
    sleep(DELAY + Duration::from_millis(100)).await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(episode_numbers(&batches[0]), vec![1]);
    assert_eq!(episode_numbers(&batches[1]), vec![2]);
}

// Scenario D / P5: shutdown force-flushes pending groups exactly once
#[tokio::test]
async fn shutdown_flushes_pending_groups() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(Duration::from_secs(10), sink.clone());

    aggregator.submit(episode("X", 1, 1)).await;
    sleep(Duration::from_millis(20)).await;
    aggregator.submit(episode("X", 1, 2)).await;
    sleep(Duration::from_millis(40)).await;

    aggregator.shutdown().await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(episode_numbers(&batches[0]), vec![1, 2]);
    assert_eq!(aggregator.pending_groups().await, 0);

    // P6: the flushed group must not fire again later via its old timer
    sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.batches().len(), 1);
}

#[tokio::test]
async fn shutdown_flushes_every_key_oldest_first() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(Duration::from_secs(10), sink.clone());

    aggregator.submit(episode("X", 1, 1)).await;
    sleep(Duration::from_millis(20)).await;
    aggregator.submit(episode("Y", 2, 7)).await;

    aggregator.shutdown().await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(episode_numbers(&batches[0]), vec![1]);
    assert_eq!(episode_numbers(&batches[1]), vec![7]);
}

#[tokio::test]
async fn shutdown_is_idempotent_and_safe_when_empty() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(DELAY, sink.clone());

    aggregator.shutdown().await;
    aggregator.submit(episode("X", 1, 1)).await;
    aggregator.shutdown().await;
    aggregator.shutdown().await;

    assert_eq!(sink.batches().len(), 1);
}

// Different series, and different seasons of one series, never co-mingle
#[tokio::test]
async fn distinct_keys_get_distinct_batches() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(DELAY, sink.clone());

    aggregator.submit(episode("X", 1, 1)).await;
    aggregator.submit(episode("X", 2, 1)).await;
    aggregator.submit(episode("Y", 1, 1)).await;

    sleep(DELAY + Duration::from_millis(200)).await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(NotificationBatch::is_single));
}

// Episodes without server ids still group through the title fallback
#[tokio::test]
async fn title_fallback_still_groups() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(DELAY, sink.clone());

    for number in 1..=2 {
        let mut event = episode("X", 1, number);
        event.series_id = None;
        event.season_id = None;
        aggregator.submit(event).await;
    }

    sleep(DELAY + Duration::from_millis(200)).await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(episode_numbers(&batches[0]), vec![1, 2]);
}

// A failed delivery drops the batch without wedging the engine
#[tokio::test]
async fn sink_failure_does_not_wedge_the_engine() {
    let sink = Arc::new(FailingSink);
    let aggregator = Aggregator::new(DELAY, sink);

    aggregator.submit(episode("X", 1, 1)).await;
    sleep(DELAY + Duration::from_millis(200)).await;
    assert_eq!(aggregator.pending_groups().await, 0);

    // Engine accepts further submissions after the failure
    aggregator.submit(episode("X", 1, 2)).await;
    assert_eq!(aggregator.pending_groups().await, 1);
    aggregator.shutdown().await;
    assert_eq!(aggregator.pending_groups().await, 0);
}

// A new event after a natural flush starts a fresh pending cycle
#[tokio::test]
async fn flushed_key_restarts_cleanly() {
    let sink = Arc::new(RecordingSink::default());
    let aggregator = Aggregator::new(DELAY, sink.clone());

    aggregator.submit(episode("X", 1, 1)).await;
    sleep(DELAY + Duration::from_millis(100)).await;
    assert_eq!(sink.batches().len(), 1);

    aggregator.submit(episode("X", 1, 2)).await;
    assert_eq!(aggregator.pending_groups().await, 1);
    sleep(DELAY + Duration::from_millis(100)).await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(episode_numbers(&batches[1]), vec![2]);
}
