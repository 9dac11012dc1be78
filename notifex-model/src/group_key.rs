use crate::event::MediaAddedEvent;
use crate::media_kind::MediaKind;
use crate::numbers::SeasonNumber;

/// Grouping identity for related "item added" events.
///
/// Movies never produce a key; episodes group per series season, keyed by
/// server identifiers when available and by series title otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AggregationKey {
    /// Server-assigned series and season identifiers
    SeriesSeason {
        series_id: String,
        season_id: String,
    },
    /// Fallback for payloads without series identifiers
    TitleSeason {
        series_title: String,
        season: SeasonNumber,
    },
}

impl AggregationKey {
    /// Derive the grouping key for an event.
    ///
    /// Always succeeds: returns `None` for movies and for episodes that
    /// cannot be keyed even through the title fallback, which callers
    /// treat as "dispatch immediately".
    pub fn derive(event: &MediaAddedEvent) -> Option<Self> {
        if event.kind == MediaKind::Movie {
            return None;
        }

        if let (Some(series_id), Some(season_id)) =
            (event.series_id.as_deref(), event.season_id.as_deref())
            && !series_id.is_empty()
            && !season_id.is_empty()
        {
            return Some(AggregationKey::SeriesSeason {
                series_id: series_id.to_string(),
                season_id: season_id.to_string(),
            });
        }

        let title = event.display_name().trim();
        if title.is_empty() {
            return None;
        }

        Some(AggregationKey::TitleSeason {
            series_title: title.to_string(),
            season: event.season_number.unwrap_or_default(),
        })
    }
}

impl std::fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationKey::SeriesSeason {
                series_id,
                season_id,
            } => write!(f, "{series_id}_{season_id}"),
            AggregationKey::TitleSeason {
                series_title,
                season,
            } => write!(f, "{series_title}_s{season}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ProviderIds;
    use crate::numbers::EpisodeNumber;
    use crate::quality::VideoQuality;
    use chrono::Utc;

    fn base_event(kind: MediaKind) -> MediaAddedEvent {
        MediaAddedEvent {
            kind,
            title: "Pilot".to_string(),
            series_name: Some("Breaking Bad".to_string()),
            series_id: Some("series-1".to_string()),
            season_id: Some("season-1".to_string()),
            season_number: Some(SeasonNumber::new(1)),
            episode_number: Some(EpisodeNumber::new(1)),
            season_name: None,
            production_year: Some(2008),
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

    #[test]
    fn movies_never_group() {
        let event = base_event(MediaKind::Movie);
        assert_eq!(AggregationKey::derive(&event), None);
    }

    #[test]
    fn episodes_key_on_server_ids() {
        let event = base_event(MediaKind::Episode);
        assert_eq!(
            AggregationKey::derive(&event),
            Some(AggregationKey::SeriesSeason {
                series_id: "series-1".to_string(),
                season_id: "season-1".to_string(),
            })
        );
    }

    #[test]
    fn missing_ids_fall_back_to_title() {
        let mut event = base_event(MediaKind::Episode);
        event.season_id = None;
        assert_eq!(
            AggregationKey::derive(&event),
            Some(AggregationKey::TitleSeason {
                series_title: "Breaking Bad".to_string(),
                season: SeasonNumber::new(1),
            })
        );
    }

    #[test]
    fn unkeyable_episode_gets_no_key() {
        let mut event = base_event(MediaKind::Episode);
        event.series_id = None;
        event.season_id = None;
        event.series_name = None;
        event.title = String::new();
        assert_eq!(AggregationKey::derive(&event), None);
    }

    #[test]
    fn different_seasons_produce_different_keys() {
        let mut s1 = base_event(MediaKind::Episode);
        let mut s2 = base_event(MediaKind::Episode);
        s1.season_id = Some("season-1".to_string());
        s2.season_id = Some("season-2".to_string());
        assert_ne!(AggregationKey::derive(&s1), AggregationKey::derive(&s2));
    }
}
