use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Date formats in priority order: unambiguous site renderings first, so a
/// permissive pattern never steals a value meant for a more specific one.
const DATE_FORMATS: &[&str] = &[
    "%a, %b %d, %Y", // Wed, Jan 28, 2026
    "%Y-%m-%d",      // 2026-01-28
    "%d-%b-%Y",      // 28-Jan-2026
    "%d-%m-%Y",      // 28-01-2026
    "%b %d, %Y",     // Jan 28, 2026
    "%B %d, %Y",     // January 28, 2026
    "%d %b %Y",      // 28 Jan 2026
    "%d %B %Y",      // 28 January 2026
    "%d %b, %Y",     // 28 Jan, 2026
];

/// Collapse runs of whitespace (incl. non-breaking spaces) to single spaces.
pub fn clean_text(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

/// "₹1,538.12 Cr" → 1538.12, "₹10 per share" → 10.0. First decimal run wins;
/// thousands separators are dropped before matching.
pub fn parse_float(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    FLOAT_RE.find(&cleaned)?.as_str().parse().ok()
}

/// All decimal runs in order: "₹95 to ₹100 per share" → [95.0, 100.0].
pub fn parse_floats(text: &str) -> Vec<f64> {
    let cleaned = text.replace(',', "");
    FLOAT_RE
        .find_iter(&cleaned)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// "120 Shares" → 120. Unit words and punctuation around the digits are ignored.
pub fn parse_int(text: &str) -> Option<i64> {
    let cleaned = text.replace(',', "");
    INT_RE.find(&cleaned)?.as_str().parse().ok()
}

/// Try each known format in priority order; first successful parse wins.
/// The site renders some dates with a stray trailing "T" ("Wed, Jan 28, 2026T"),
/// which is stripped before parsing.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return None;
    }
    let s = strip_trailing_t(&cleaned);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn strip_trailing_t(s: &str) -> &str {
    match s.strip_suffix('T') {
        Some(rest) if rest.ends_with(|c: char| c.is_ascii_digit()) => rest,
        _ => s,
    }
}

// ── Tests ──
