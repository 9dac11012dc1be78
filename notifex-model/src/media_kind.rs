use std::fmt::Display;
use std::fmt::Formatter;

/// Simple enum for the kinds of items the library reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MediaKind {
    /// Standalone movie
    Movie,
    /// Episode belonging to a series season
    Episode,
}

impl MediaKind {
    /// TMDB path segment for this kind (`movie` / `tv`)
    pub fn tmdb_segment(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Episode => "tv",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "Movie"),
            MediaKind::Episode => write!(f, "Episode"),
        }
    }
}
