//! Core library for the notifex notification relay.
//!
//! Receives normalized "item added" events, aggregates episode events per
//! series season behind a sliding debounce window, and delivers rendered
//! notifications through a pluggable flush sink. The production sink
//! enriches events with TMDB metadata and posts to Telegram.
#![allow(missing_docs)]

pub mod aggregator;
pub mod error;
pub mod providers;
pub mod render;
pub mod sink;
pub mod telegram;
pub mod webhook;

pub use aggregator::{Aggregator, FlushSink, NotificationBatch};
pub use error::{NotifyError, Result};
pub use providers::tmdb::{TmdbEnrichment, TmdbProvider};
pub use sink::NotificationSink;
pub use telegram::TelegramClient;
