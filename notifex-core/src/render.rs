//! Notification message rendering.
//!
//! Produces the Markdown title/body pair sent to Telegram, for both a
//! single item and an aggregated season batch. The copy intentionally
//! mirrors the established notification format (Chinese labels, emoji
//! prefixes, fullwidth separators).

use notifex_model::{EpisodeNumber, MediaAddedEvent, MediaKind, SeasonNumber, format_size};

use crate::providers::tmdb::TmdbEnrichment;

const OVERVIEW_LIMIT: usize = 160;

/// Rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
}

/// Render a batch: single-item layout for one event, aggregated layout
/// for a multi-episode group.
pub fn render_batch(events: &[MediaAddedEvent], enrichment: Option<&TmdbEnrichment>) -> Message {
    match events {
        [event] => render_single(event, enrichment),
        _ => render_group(events, enrichment),
    }
}

pub fn render_single(event: &MediaAddedEvent, enrichment: Option<&TmdbEnrichment>) -> Message {
    let mut title = format!("🎬 {}", event.title_with_year());
    if let Some(marker) = event.season_episode() {
        title.push(' ');
        title.push_str(&marker);
    } else if let Some(season_name) = event.season_name.as_deref() {
        title.push(' ');
        title.push_str(season_name);
    }
    title.push_str(" 已入库");

    let body = build_body(
        event,
        enrichment,
        event.file_count,
        event.file_size_bytes,
        false,
    );

    Message { title, body }
}

pub fn render_group(events: &[MediaAddedEvent], enrichment: Option<&TmdbEnrichment>) -> Message {
    let first = &events[0];

    let ranges = merge_episode_ranges(events);
    let range_text = ranges.join(", ");

    let mut title = format!("🎬 {}", first.title_with_year());
    if !range_text.is_empty() {
        title.push(' ');
        title.push_str(&range_text);
    }
    title.push_str(&format!(" 已入库（共 {} 集）", events.len()));

    let file_count: u32 = events.iter().map(|event| event.file_count).sum();
    let total_bytes: u64 = events.iter().map(|event| event.file_size_bytes).sum();

    let body = build_body(first, enrichment, file_count, total_bytes, true);

    Message { title, body }
}

fn build_body(
    event: &MediaAddedEvent,
    enrichment: Option<&TmdbEnrichment>,
    file_count: u32,
    total_bytes: u64,
    aggregated: bool,
) -> String {
    let mut lines: Vec<String> = vec!["📢 媒体库：Emby".to_string()];

    if let Some(rating) = event.rating {
        lines.push(format!("⭐️ 评分：{rating}/10"));
    }

    match event.kind {
        MediaKind::Episode => lines.push("📺 媒体类型：剧集".to_string()),
        MediaKind::Movie => lines.push("🎦 媒体类型：电影".to_string()),
    }

    if !event.genres.is_empty() {
        lines.push(format!("🏷 归类：{}", event.genres.join(" / ")));
    }

    if let Some(quality) = event.quality.label() {
        lines.push(format!("🖼 质量：{quality}"));
    }

    if file_count > 0 {
        lines.push(format!("📂 文件：{file_count} 个"));
    }

    if total_bytes > 0 {
        let label = if aggregated { "总大小" } else { "大小" };
        lines.push(format!("💾 {label}：{}", format_size(total_bytes)));
    }

    let tmdb_id = effective_tmdb_id(event, enrichment);
    if let Some(id) = tmdb_id.as_deref() {
        lines.push(format!("🍿 TMDB ID：{id}"));
    }

    let overview = enrichment
        .and_then(|enrichment| enrichment.overview.as_deref())
        .or(event.overview.as_deref());
    if let Some(overview) = overview {
        lines.push(String::new());
        lines.push(format!("📝 简介：{}", truncate_overview(overview)));
    }

    let links = build_links(event, tmdb_id.as_deref());
    if !links.is_empty() {
        lines.push(String::new());
        lines.push("🌐 链接：".to_string());
        lines.push(links.join(" | "));
    }

    lines.join("\n")
}

fn effective_tmdb_id(
    event: &MediaAddedEvent,
    enrichment: Option<&TmdbEnrichment>,
) -> Option<String> {
    event.provider_ids.tmdb.clone().or_else(|| {
        enrichment
            .and_then(|enrichment| enrichment.tmdb_id)
            .map(|id| id.to_string())
    })
}

fn build_links(event: &MediaAddedEvent, tmdb_id: Option<&str>) -> Vec<String> {
    let mut links = Vec::new();

    if let Some(id) = tmdb_id {
        links.push(format!(
            "🔗 [TMDB](https://www.themoviedb.org/{}/{id})",
            event.kind.tmdb_segment()
        ));
    }

    if let Some(douban) = event.provider_ids.douban.as_deref() {
        links.push(format!(
            "🎬 [豆瓣](https://movie.douban.com/subject/{douban}/)"
        ));
    } else if let Some(imdb) = event.provider_ids.imdb.as_deref() {
        links.push(format!(
            "🎬 [豆瓣](https://www.douban.com/search?cat=1002&q={imdb})"
        ));
    } else {
        let title = event.title_with_year();
        if !title.is_empty() {
            let encoded: String =
                url::form_urlencoded::byte_serialize(title.as_bytes()).collect();
            links.push(format!(
                "🎬 [豆瓣](https://www.douban.com/search?cat=1002&q={encoded})"
            ));
        }
    }

    if let Some(imdb) = event.provider_ids.imdb.as_deref() {
        links.push(format!("🌟 [IMDb](https://www.imdb.com/title/{imdb}/)"));
    }

    links
}

// Char-based so CJK synopses never split inside a code point
fn truncate_overview(overview: &str) -> String {
    let mut truncated: String = overview.chars().take(OVERVIEW_LIMIT).collect();
    if overview.chars().count() > OVERVIEW_LIMIT {
        truncated.push('…');
    }
    truncated
}

/// Coalesce consecutive episodes into range markers, e.g.
/// `[S01E01, S01E02, S01E03, S01E05]` -> `["S01E01-E03", "S01E05"]`.
/// Events missing season or episode numbers are skipped.
pub fn merge_episode_ranges(events: &[MediaAddedEvent]) -> Vec<String> {
    let mut numbers: Vec<(SeasonNumber, EpisodeNumber)> = events
        .iter()
        .filter_map(|event| Some((event.season_number?, event.episode_number?)))
        .collect();
    numbers.sort();
    numbers.dedup();

    let mut ranges = Vec::new();
    let mut run: Option<(SeasonNumber, EpisodeNumber, EpisodeNumber)> = None;

    for (season, episode) in numbers {
        match run {
            Some((run_season, start, end))
                if run_season == season && episode.value() == end.value() + 1 =>
            {
                run = Some((run_season, start, episode));
            }
            Some(finished) => {
                ranges.push(format_range(finished));
                run = Some((season, episode, episode));
            }
            None => {
                run = Some((season, episode, episode));
            }
        }
    }

    if let Some(finished) = run {
        ranges.push(format_range(finished));
    }

    ranges
}

fn format_range((season, start, end): (SeasonNumber, EpisodeNumber, EpisodeNumber)) -> String {
    if start == end {
        format!("S{:02}E{:02}", season.value(), start.value())
    } else {
        format!(
            "S{:02}E{:02}-E{:02}",
            season.value(),
            start.value(),
            end.value()
        )
    }
}
