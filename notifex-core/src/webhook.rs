//! Emby webhook payload model and normalization.
//!
//! Emby (and the notification templates layered on top of it) deliver the
//! same item in several shapes: wrapped under a `tv`/`mv` array, as a bare
//! array, or as a single envelope. Parsing always degrades instead of
//! failing; anything we cannot normalize is simply skipped upstream.

use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use notifex_model::{
    EpisodeNumber, MediaAddedEvent, MediaKind, ProviderIds, SeasonNumber, VideoQuality,
    extract_quality_term,
};

/// Inbound webhook body in any of its known shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WebhookBody {
    Keyed(KeyedEnvelopes),
    Many(Vec<Envelope>),
    One(Box<Envelope>),
}

/// Template-file shape: items wrapped under `tv` or `mv`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyedEnvelopes {
    #[serde(default)]
    pub tv: Option<Vec<Envelope>>,
    #[serde(default)]
    pub mv: Option<Vec<Envelope>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    pub event: Option<String>,
    pub item: Option<Item>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    #[serde(rename = "Type", default)]
    pub item_type: String,
    pub name: Option<String>,
    pub series_name: Option<String>,
    pub series_id: Option<String>,
    pub season_id: Option<String>,
    pub season_name: Option<String>,
    pub index_number: Option<u16>,
    pub parent_index_number: Option<u16>,
    pub production_year: Option<i32>,
    #[serde(default)]
    pub provider_ids: RawProviderIds,
    pub community_rating: Option<f32>,
    pub critic_rating: Option<f32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub file_name: Option<String>,
    pub path: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: Option<u64>,
    pub overview: Option<String>,
    pub id: Option<String>,
    #[serde(default)]
    pub image_tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawProviderIds {
    #[serde(rename = "Tmdb")]
    pub tmdb: Option<String>,
    #[serde(rename = "MovieDb")]
    pub movie_db: Option<String>,
    #[serde(rename = "Imdb")]
    pub imdb: Option<String>,
}

impl WebhookBody {
    fn envelopes(&self) -> &[Envelope] {
        match self {
            WebhookBody::Keyed(keyed) => keyed
                .tv
                .as_deref()
                .or(keyed.mv.as_deref())
                .unwrap_or_default(),
            WebhookBody::Many(envelopes) => envelopes,
            WebhookBody::One(envelope) => std::slice::from_ref(envelope),
        }
    }

    /// Event name (`library.new`, `playback.start`, ...) if present
    pub fn event_name(&self) -> Option<&str> {
        self.envelopes()
            .first()
            .and_then(|envelope| envelope.event.as_deref())
    }

    /// Normalize the first carried item into a `MediaAddedEvent`.
    ///
    /// Returns `None` when the body carries no item at all; individual
    /// missing fields degrade to defaults instead.
    pub fn normalize(&self) -> Option<MediaAddedEvent> {
        let envelope = self.envelopes().first()?;
        let item = envelope.item.as_ref()?;

        let is_episode = item.item_type == "Episode";
        let kind = if is_episode {
            MediaKind::Episode
        } else {
            MediaKind::Movie
        };

        let title = item.name.clone().unwrap_or_default();
        if is_episode && item.series_name.as_deref().is_none_or(str::is_empty) {
            warn!(episode = %title, "episode payload carries no SeriesName, using item name");
        }

        // Community rating is already on the 0-10 scale; critic ratings
        // arrive as percentages.
        let rating = item
            .community_rating
            .or(item.critic_rating.map(|critic| critic / 10.0));

        let term = item
            .file_name
            .as_deref()
            .map(extract_quality_term)
            .filter(|term| !term.is_empty())
            .or_else(|| item.path.as_deref().map(extract_quality_term))
            .unwrap_or_default();
        let quality = VideoQuality::detect(
            item.width.unwrap_or(0),
            item.height.unwrap_or(0),
            &term,
        );

        let overview = item
            .overview
            .clone()
            .filter(|overview| !overview.is_empty())
            .or_else(|| envelope.description.clone());

        Some(MediaAddedEvent {
            kind,
            title,
            series_name: item.series_name.clone(),
            series_id: item.series_id.clone(),
            season_id: item.season_id.clone(),
            season_number: item.parent_index_number.map(SeasonNumber::new),
            episode_number: item.index_number.map(EpisodeNumber::new),
            season_name: item.season_name.clone().filter(|name| !name.is_empty()),
            production_year: item.production_year.filter(|year| *year != 0),
            rating,
            genres: item.genres.clone(),
            quality,
            file_count: 1,
            file_size_bytes: item.size.unwrap_or(0),
            provider_ids: ProviderIds {
                tmdb: item
                    .provider_ids
                    .tmdb
                    .clone()
                    .or_else(|| item.provider_ids.movie_db.clone()),
                imdb: item.provider_ids.imdb.clone(),
                douban: None,
            },
            overview,
            item_id: item.id.clone(),
            primary_image_tag: item.image_tags.get("Primary").cloned(),
            received_at: Utc::now(),
        })
    }
}
