use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::ids::ProviderIds;
use crate::media_kind::MediaKind;
use crate::numbers::{EpisodeNumber, SeasonNumber};
use crate::quality::VideoQuality;

// Bare episode labels like "第3集", "Episode 2" or "12" mean the payload
// carried no real series name; appending a year to those reads badly.
static EPISODE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(第\s*\d+\s*集|Episode\s+\d+|\d+)$").expect("valid regex")
});

/// One normalized "item added" occurrence from the media server.
///
/// The kind is fixed at construction; everything optional may be absent
/// without affecting classification or aggregation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MediaAddedEvent {
    pub kind: MediaKind,
    /// Item display name (movie title, or episode title for episodes)
    pub title: String,
    pub series_name: Option<String>,
    pub series_id: Option<String>,
    pub season_id: Option<String>,
    pub season_number: Option<SeasonNumber>,
    pub episode_number: Option<EpisodeNumber>,
    pub season_name: Option<String>,
    pub production_year: Option<i32>,
    /// Community rating on a 0-10 scale
    pub rating: Option<f32>,
    pub genres: Vec<String>,
    pub quality: VideoQuality,
    /// Number of files this event represents, >= 1
    pub file_count: u32,
    pub file_size_bytes: u64,
    pub provider_ids: ProviderIds,
    pub overview: Option<String>,
    pub item_id: Option<String>,
    pub primary_image_tag: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl MediaAddedEvent {
    /// Name used for display and grouping: the series name for episodes
    /// when present, otherwise the item's own title.
    pub fn display_name(&self) -> &str {
        match self.kind {
            MediaKind::Episode => self
                .series_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .unwrap_or(&self.title),
            MediaKind::Movie => &self.title,
        }
    }

    /// Display name with the production year appended, e.g. `剧名 (2023)`.
    ///
    /// The year is skipped when it is already embedded in the name or the
    /// name is a bare episode label.
    pub fn title_with_year(&self) -> String {
        let name = self.display_name();
        let Some(year) = self.production_year else {
            return name.to_string();
        };

        if EPISODE_LABEL_RE.is_match(name.trim()) {
            return name.to_string();
        }

        let ascii = format!("({year})");
        let fullwidth = format!("（{year}）");
        if name.contains(&ascii) || name.contains(&fullwidth) {
            return name.to_string();
        }

        format!("{name} ({year})")
    }

    /// `S01E02` style marker for episodes with known season and episode
    pub fn season_episode(&self) -> Option<String> {
        match (self.season_number, self.episode_number) {
            (Some(season), Some(episode)) => Some(format!(
                "S{:02}E{:02}",
                season.value(),
                episode.value()
            )),
            _ => None,
        }
    }
}
