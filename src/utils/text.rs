use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SNAKE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("valid regex"));

/// Unicode NFC normalization.
pub fn normalize(text: &str) -> String {
    text.nfc().collect()
}

/// Collapses every whitespace run to a single space and trims both ends.
pub fn clean_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Keeps ASCII letters, digits, whitespace and any character listed in `keep`.
pub fn remove_special_chars(text: &str, keep: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || keep.contains(*c))
        .collect()
}

pub fn to_snake_case(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let joined = SNAKE_SEPARATORS.replace_all(&lowered, "_");
    NON_WORD.replace_all(&joined, "").into_owned()
}

/// Shortens `text` to at most `max_length` characters, `suffix` included.
pub fn truncate(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let keep = max_length.saturating_sub(suffix.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

/// `None` and whitespace-only strings are empty.
pub fn is_empty(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
