use std::sync::LazyLock;

use regex::Regex;

static LESSON_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)::L-\d+").expect("lesson suffix pattern is valid"));

/// Strips a `::L-<digits>` lesson suffix, keeping everything before the first
/// occurrence. Names without the suffix pass through unchanged.
pub fn extract_display_name(raw: &str) -> &str {
    LESSON_SUFFIX
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|prefix| prefix.as_str())
        .unwrap_or(raw)
}
