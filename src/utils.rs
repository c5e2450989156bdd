use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

// Compiled regexes for beatmap URLs, tried in this order:
// beatmapset URL with difficulty anchor, short `/b/` URL, `/beatmaps/` URL
static BEATMAP_URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"beatmapsets/\d+#[a-z]+/(\d+)").unwrap(),
        Regex::new(r"/b/(\d+)").unwrap(),
        Regex::new(r"/beatmaps/(\d+)").unwrap(),
    ]
});

/// Resolve a beatmap id from what the user typed.
///
/// Supported forms:
/// - Plain id: "67890"
/// - Beatmapset URL: "https://osu.ppy.sh/beatmapsets/12345#osu/67890"
/// - Short URL: "https://osu.ppy.sh/b/111"
/// - Beatmap URL: "https://osu.ppy.sh/beatmaps/111"
///
/// # Examples
/// ```
/// use pp_client::utils::resolve_beatmap_id;
/// assert_eq!(resolve_beatmap_id("67890"), Some(67890));
/// assert_eq!(resolve_beatmap_id("https://osu.ppy.sh/b/111"), Some(111));
/// assert_eq!(resolve_beatmap_id("not-a-beatmap"), None);
/// ```
pub fn resolve_beatmap_id(input: &str) -> Option<u64> {
    let trimmed = input.trim();

    if let Some(id) = parse_optional_int::<u64>(trimmed) {
        return Some(id);
    }

    BEATMAP_URL_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(trimmed)
            .and_then(|captures| captures[1].parse::<u64>().ok())
    })
}

/// Parse an integer field, `None` when it is empty or not a number.
pub fn parse_optional_int<T: FromStr>(input: &str) -> Option<T> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<T>().ok()
}

/// Parse a percentage, accepting either `.` or `,` as decimal separator.
///
/// Range checking is left to the caller; non-finite values count as unparsable.
pub fn parse_percentage(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|pct| pct.is_finite())
}

/// Trim and lowercase a user name, the way the server keys its queue.
pub fn normalize_user(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}
