/// External provider identifiers attached to a library item.
///
/// Any of these may be absent; classification and aggregation never
/// depend on their presence.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProviderIds {
    pub tmdb: Option<String>,
    pub imdb: Option<String>,
    pub douban: Option<String>,
}

impl ProviderIds {
    pub fn is_empty(&self) -> bool {
        self.tmdb.is_none() && self.imdb.is_none() && self.douban.is_none()
    }

    /// TMDB id parsed as a numeric identifier, when present and numeric
    pub fn tmdb_numeric(&self) -> Option<u64> {
        self.tmdb.as_deref().and_then(|id| id.parse().ok())
    }
}
