//! Best-effort TMDB metadata enrichment.
//!
//! Lookups here only ever improve a notification; every failure path
//! degrades to the raw event data and is logged at debug/warn level.

use tmdb_api::{
    client::{Client, reqwest::ReqwestExecutor},
    movie::{details::MovieDetails, search::MovieSearch},
    prelude::Command,
    tvshow::{details::TVShowDetails, search::TVShowSearch},
};
use tracing::{debug, warn};

use notifex_model::{MediaAddedEvent, MediaKind};

/// Metadata pulled from TMDB for one notification
#[derive(Debug, Clone, Default)]
pub struct TmdbEnrichment {
    pub tmdb_id: Option<u64>,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
}

impl TmdbEnrichment {
    pub fn is_empty(&self) -> bool {
        self.tmdb_id.is_none() && self.poster_url.is_none() && self.overview.is_none()
    }
}

pub struct TmdbProvider {
    client: Client<ReqwestExecutor>,
    image_base_url: String,
}

impl std::fmt::Debug for TmdbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbProvider")
            .field("image_base_url", &self.image_base_url)
            .finish_non_exhaustive()
    }
}

impl TmdbProvider {
    pub fn new(api_key: String, image_base_url: String) -> Self {
        let client = Client::new(api_key);
        Self {
            client,
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch poster and synopsis for the given event.
    ///
    /// Resolves a TMDB id by title search when the payload carried none.
    /// Always succeeds; an empty enrichment means the notification falls
    /// back to Emby-supplied data.
    pub async fn enrich(&self, event: &MediaAddedEvent) -> TmdbEnrichment {
        let tmdb_id = match event.provider_ids.tmdb_numeric() {
            Some(id) => Some(id),
            None => self.resolve_id(event).await,
        };
        let Some(id) = tmdb_id else {
            return TmdbEnrichment::default();
        };

        let (poster_path, overview) = match event.kind {
            MediaKind::Movie => match MovieDetails::new(id).execute(&self.client).await {
                Ok(details) => {
                    let overview = Some(details.inner.overview.clone());
                    (details.inner.poster_path.clone(), overview)
                }
                Err(error) => {
                    warn!(tmdb_id = id, error = %error, "TMDB movie details lookup failed");
                    (None, None)
                }
            },
            MediaKind::Episode => match TVShowDetails::new(id).execute(&self.client).await {
                Ok(details) => (
                    details.inner.poster_path.clone(),
                    details.inner.overview.clone(),
                ),
                Err(error) => {
                    warn!(tmdb_id = id, error = %error, "TMDB series details lookup failed");
                    (None, None)
                }
            },
        };

        TmdbEnrichment {
            tmdb_id: Some(id),
            poster_url: poster_path
                .map(|path| format!("{}{}", self.image_base_url, path)),
            overview: overview.filter(|overview| !overview.is_empty()),
        }
    }

    /// Resolve a TMDB id by title (and year, for movies) search
    async fn resolve_id(&self, event: &MediaAddedEvent) -> Option<u64> {
        let query = event.display_name().trim();
        if query.is_empty() {
            return None;
        }

        let id = match event.kind {
            MediaKind::Movie => {
                let year = event.production_year.and_then(|year| u16::try_from(year).ok());
                let search = MovieSearch::new(query.to_string()).with_year(year);
                search
                    .execute(&self.client)
                    .await
                    .ok()?
                    .results
                    .first()
                    .map(|result| result.inner.id)
            }
            MediaKind::Episode => TVShowSearch::new(query.to_string())
                .execute(&self.client)
                .await
                .ok()?
                .results
                .first()
                .map(|result| result.inner.id),
        };

        if let Some(id) = id {
            debug!(query, tmdb_id = id, "resolved TMDB id by title search");
        }
        id
    }
}
