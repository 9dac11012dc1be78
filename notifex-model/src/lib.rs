//! Core data model definitions shared across notifex crates.
#![allow(missing_docs)]

pub mod error;
pub mod event;
pub mod group_key;
pub mod ids;
pub mod media_kind;
pub mod numbers;
pub mod quality;
pub mod size;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use event::MediaAddedEvent;
pub use group_key::AggregationKey;
pub use ids::ProviderIds;
pub use media_kind::MediaKind;
pub use numbers::{EpisodeNumber, SeasonNumber};
pub use quality::{Resolution, VideoQuality, extract_quality_term};
pub use size::format_size;
