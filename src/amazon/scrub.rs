//! Review body cleanup pipeline.
//!
//! Review bodies on media-bearing reviews can carry fragments of the inline
//! video player's JSON configuration. The cleanup is an ordered list of
//! named stages, each a pure text transform, so individual stages stay
//! testable against crafted contaminated strings.

use regex_lite::Regex;
use std::sync::LazyLock;

/// JSON-looking keys that only appear in video-player configuration.
static PLAYER_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""(?:videoUrl|streamingUrls|imageUrl|mediaObjectId|hlsUrl|closedCaptions)"\s*:"#,
    )
    .unwrap()
});

/// Runs of horizontal whitespace.
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Three or more consecutive newlines.
static BLANK_LINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// One cleanup stage: a name for diagnostics plus the transform itself.
pub struct Stage {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// The stages applied to every candidate body text, in order.
pub static STAGES: &[Stage] = &[
    Stage {
        name: "strip-player-config",
        apply: strip_player_config,
    },
    Stage {
        name: "collapse-whitespace",
        apply: collapse_whitespace,
    },
];

/// Applies the full pipeline to a raw body text.
///
/// An empty result means nothing usable survived; the caller decides the
/// fallback (title, placeholder, or discard).
pub fn clean_body(raw: &str) -> String {
    STAGES
        .iter()
        .fold(raw.to_string(), |text, stage| (stage.apply)(&text))
}

/// Returns true if the text looks like video-player configuration JSON.
pub fn looks_like_player_config(text: &str) -> bool {
    PLAYER_MARKERS.is_match(text)
}

/// Drops leaked player-config JSON, keeping only text after the last
/// closing brace. Text without player markers passes through untouched.
fn strip_player_config(text: &str) -> String {
    if !PLAYER_MARKERS.is_match(text) {
        return text.to_string();
    }
    let remainder = match text.rfind('}') {
        Some(idx) => &text[idx + 1..],
        // Markers without a closing brace: the whole text is config spill.
        None => "",
    };
    remainder
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ')' | ']' | ',' | ';'))
        .to_string()
}

/// Normalizes line endings, trims each line, collapses whitespace runs and
/// runs of blank lines.
fn collapse_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = unified
        .lines()
        .map(|line| SPACE_RUNS.replace_all(line.trim(), " ").into_owned())
        .collect();
    let joined = lines.join("\n");
    BLANK_LINE_RUNS
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_SPILL: &str = r#"{"videoUrl":"https:\/\/m.media-amazon.com\/vid.mp4","imageUrl":"https:\/\/m.media-amazon.com\/thumb.jpg","mediaObjectId":"abc123"}"#;

    #[test]
    fn test_clean_text_passes_through() {
        let body = "Works great.\nBattery lasts all week.";
        assert_eq!(clean_body(body), body);
    }

    #[test]
    fn test_player_config_fully_removed() {
        assert_eq!(clean_body(PLAYER_SPILL), "");
    }

    #[test]
    fn test_text_after_config_survives() {
        let contaminated = format!("{} Really happy with this purchase.", PLAYER_SPILL);
        assert_eq!(clean_body(&contaminated), "Really happy with this purchase.");
    }

    #[test]
    fn test_markers_without_closing_brace_discard_everything() {
        let truncated = r#""videoUrl": "https://m.media-amazon.com/vid.mp4", "hlsUrl""#;
        assert_eq!(clean_body(truncated), "");
    }

    #[test]
    fn test_braces_without_markers_are_kept() {
        let body = "The manual says {insert batteries} which made me laugh.";
        assert_eq!(clean_body(body), body);
    }

    #[test]
    fn test_stray_punctuation_after_config_dropped() {
        let contaminated = format!("{}], \n  Decent sound.", PLAYER_SPILL);
        assert_eq!(clean_body(&contaminated), "Decent sound.");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let messy = "Line one.\r\n\r\n\r\n\r\nLine   two.\t\tEnd.   ";
        assert_eq!(clean_body(messy), "Line one.\n\nLine two. End.");
    }

    #[test]
    fn test_looks_like_player_config() {
        assert!(looks_like_player_config(PLAYER_SPILL));
        assert!(looks_like_player_config(r#"x "streamingUrls": [y]"#));
        assert!(!looks_like_player_config("I mentioned videoUrl in prose"));
        assert!(!looks_like_player_config("A perfectly normal review"));
    }

    #[test]
    fn test_stage_names_stable() {
        let names: Vec<&str> = STAGES.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["strip-player-config", "collapse-whitespace"]);
    }
}
