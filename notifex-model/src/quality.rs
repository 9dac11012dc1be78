use std::sync::LazyLock;

use regex::Regex;

static DOLBY_VISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dolby.?vision|\bdv\b").expect("valid regex"));

/// Resolution classes we bother distinguishing in notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Resolution {
    Uhd2160,
    Fhd1080,
    Hd720,
}

impl Resolution {
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Uhd2160 => "2160p (4K)",
            Resolution::Fhd1080 => "1080p",
            Resolution::Hd720 => "720p",
        }
    }

    /// Classify by reported video dimensions. Thresholds are loose on
    /// purpose: encodes frequently crop a few lines off the nominal frame.
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        if width >= 3800 || height >= 2000 {
            Some(Resolution::Uhd2160)
        } else if width >= 1900 || height >= 1000 {
            Some(Resolution::Fhd1080)
        } else if width >= 1200 || height >= 700 {
            Some(Resolution::Hd720)
        } else {
            None
        }
    }

    fn from_term(term_lower: &str) -> Option<Self> {
        if term_lower.contains("2160p") || term_lower.contains("4k") {
            Some(Resolution::Uhd2160)
        } else if term_lower.contains("1080p") {
            Some(Resolution::Fhd1080)
        } else if term_lower.contains("720p") {
            Some(Resolution::Hd720)
        } else {
            None
        }
    }
}

/// Video quality attributes derived from stream dimensions and the
/// release terms embedded in the file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoQuality {
    pub resolution: Option<Resolution>,
    pub hdr10: bool,
    pub dolby_vision: bool,
    pub imax: bool,
}

impl VideoQuality {
    /// Derive quality from dimensions, falling back to the quality term
    /// string when the payload carries no usable width/height.
    pub fn detect(width: u32, height: u32, term: &str) -> Self {
        let term_lower = term.to_lowercase();
        let resolution = Resolution::from_dimensions(width, height)
            .or_else(|| Resolution::from_term(&term_lower));
        let dolby_vision = DOLBY_VISION_RE.is_match(&term_lower);
        // A bare DV tag usually implies the HDR token belongs to the DV
        // profile, so only flag HDR10 when DV is absent.
        let hdr10 = term_lower.contains("hdr") && !dolby_vision;
        let imax = term_lower.contains("imax");

        VideoQuality {
            resolution,
            hdr10,
            dolby_vision,
            imax,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resolution.is_none() && !self.hdr10 && !self.dolby_vision && !self.imax
    }

    /// Human readable label, e.g. `2160p (4K)｜HDR10｜Dolby Vision`
    pub fn label(&self) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(res) = self.resolution {
            parts.push(res.label());
        }
        if self.hdr10 {
            parts.push("HDR10");
        }
        if self.dolby_vision {
            parts.push("Dolby Vision");
        }
        if self.imax {
            parts.push("IMAX");
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("｜"))
        }
    }
}

/// Pull a quality term out of a file name or path, e.g. `2160p (4K) HDR`
pub fn extract_quality_term(filename: &str) -> String {
    if filename.is_empty() {
        return String::new();
    }

    let lower = filename.to_lowercase();
    let mut found: Vec<&str> = Vec::new();

    if lower.contains("2160p") || lower.contains("4k") {
        found.push("2160p (4K)");
    }
    if lower.contains("1080p") {
        found.push("1080p");
    }
    if lower.contains("720p") {
        found.push("720p");
    }
    if contains_hdr_without_hdr10(&lower) {
        found.push("HDR");
    }
    if DOLBY_VISION_RE.is_match(&lower) {
        found.push("Dolby Vision");
    }
    if lower.contains("imax") {
        found.push("IMAX");
    }

    found.join(" ")
}

// "hdr" not immediately followed by "10" (the regex crate has no lookahead)
fn contains_hdr_without_hdr10(lower: &str) -> bool {
    lower
        .match_indices("hdr")
        .any(|(idx, _)| !lower[idx + 3..].starts_with("10"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_take_priority_over_term() {
        let quality = VideoQuality::detect(3840, 2160, "720p");
        assert_eq!(quality.resolution, Some(Resolution::Uhd2160));
    }

    #[test]
    fn falls_back_to_term_resolution() {
        let quality = VideoQuality::detect(0, 0, "Some.Show.S01E01.1080p.WEB-DL");
        assert_eq!(quality.resolution, Some(Resolution::Fhd1080));
    }

    #[test]
    fn hdr10_suppressed_by_dolby_vision() {
        let quality = VideoQuality::detect(0, 0, "Movie.2160p.HDR.DV.mkv");
        assert!(quality.dolby_vision);
        assert!(!quality.hdr10);
    }

    #[test]
    fn label_joins_with_fullwidth_bar() {
        let quality = VideoQuality::detect(3840, 2160, "hdr imax");
        assert_eq!(quality.label().unwrap(), "2160p (4K)｜HDR10｜IMAX");
    }

    #[test]
    fn extract_term_from_filename() {
        assert_eq!(
            extract_quality_term("The.Matrix.1999.2160p.HDR.BluRay.mkv"),
            "2160p (4K) HDR"
        );
        assert_eq!(extract_quality_term("show.720p.mkv"), "720p");
        assert_eq!(extract_quality_term(""), "");
    }

    #[test]
    fn hdr10_token_alone_is_not_plain_hdr() {
        assert_eq!(extract_quality_term("Movie.1080p.HDR10.mkv"), "1080p");
    }
}
