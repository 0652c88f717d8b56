use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::parser::document::{Document, Fragment, LabelQuery};
use crate::parser::fields::Pick;
use crate::parser::normalize::parse_date;

// "Fri, Jan 9, 2026" — the site's usual rendering, weekday included.
static WDAY_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{3},\s*[A-Za-z]{3}\s+\d{1,2},\s+\d{4}").unwrap());
// "Jan 20, 2026" / "January 20, 2026" — used inside range sentences.
static MDY_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{3,9}\s+\d{1,2},\s+\d{4}").unwrap());
// "20 to 22 Jan, 2026" — the merged open/close cell.
static DAY_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s+to\s+(\d{1,2})\s+([A-Za-z]{3,9}),?\s+(\d{4})").unwrap());

/// Date behind any of several alternative labels. A matched value may hold a
/// single date or a range sentence ("opens on Fri, Jan 9, 2026 and closes on
/// Tue, Jan 13, 2026"); `pick` selects the end that belongs to this field.
/// Open/close fields additionally fall back to the merged "IPO Date" cell.
pub fn extract_date(doc: &Document, labels: &[&str], pick: Pick, combined: bool) -> Option<NaiveDate> {
    for label in labels {
        let Some(Fragment::Text(value)) = doc.label_value(&LabelQuery::contains_ci(label)) else {
            continue;
        };
        if let Some(d) = pick_date(&value, pick) {
            return Some(d);
        }
        if let Some(d) = parse_date(&value) {
            return Some(d);
        }
    }

    if combined {
        if let Some(Fragment::Text(value)) = doc.label_value(&LabelQuery::contains_ci("IPO Date")) {
            if let Some(d) = day_range(&value, pick) {
                return Some(d);
            }
            if let Some(d) = pick_date(&value, pick) {
                return Some(d);
            }
        }
    }

    None
}

/// First or last full date inside a free-text value.
fn pick_date(value: &str, pick: Pick) -> Option<NaiveDate> {
    let mut hits: Vec<&str> = WDAY_DATE_RE.find_iter(value).map(|m| m.as_str()).collect();
    if hits.is_empty() {
        hits = MDY_DATE_RE.find_iter(value).map(|m| m.as_str()).collect();
    }
    let chosen = match pick {
        Pick::First => hits.first(),
        Pick::Last => hits.last(),
    }?;
    parse_date(chosen)
}

/// "20 to 22 Jan, 2026" → 2026-01-20 (First) / 2026-01-22 (Last).
fn day_range(value: &str, pick: Pick) -> Option<NaiveDate> {
    let caps = DAY_RANGE_RE.captures(value)?;
    let day = match pick {
        Pick::First => &caps[1],
        Pick::Last => &caps[2],
    };
    parse_date(&format!("{} {} {}", day, &caps[3], &caps[4]))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(rows: &[(&str, &str)]) -> Document {
        let body: String = rows
            .iter()
            .map(|(l, v)| format!("<tr><td>{}</td><td>{}</td></tr>", l, v))
            .collect();
        Document::parse(&format!("<table>{}</table>", body))
    }

    #[test]
    fn plain_date_value() {
        let d = table(&[("Basis of Allotment", "Wed, Jan 14, 2026T")]);
        assert_eq!(
            extract_date(&d, &["Allotment Date", "Basis of Allotment"], Pick::First, false),
            Some(ymd(2026, 1, 14))
        );
    }

    #[test]
    fn range_sentence_first_and_last() {
        let d = table(&[(
            "Issue Open Date",
            "opens on Fri, Jan 9, 2026 and closes on Tue, Jan 13, 2026",
        )]);
        assert_eq!(
            extract_date(&d, &["Issue Open"], Pick::First, false),
            Some(ymd(2026, 1, 9))
        );
        assert_eq!(
            extract_date(&d, &["Issue Open"], Pick::Last, false),
            Some(ymd(2026, 1, 13))
        );
    }

    #[test]
    fn combined_cell_day_range() {
        let d = table(&[("IPO Date", "20 to 22 Jan, 2026")]);
        assert_eq!(extract_date(&d, &["Issue Open"], Pick::First, true), Some(ymd(2026, 1, 20)));
        assert_eq!(extract_date(&d, &["Issue Close"], Pick::Last, true), Some(ymd(2026, 1, 22)));
    }

    #[test]
    fn combined_cell_spelled_range() {
        let d = table(&[("IPO Date", "Jan 20, 2026 to Jan 22, 2026")]);
        assert_eq!(extract_date(&d, &["Issue Open"], Pick::First, true), Some(ymd(2026, 1, 20)));
        assert_eq!(extract_date(&d, &["Issue Close"], Pick::Last, true), Some(ymd(2026, 1, 22)));
    }

    #[test]
    fn label_priority_order() {
        let d = table(&[
            ("Listing At", "BSE, NSE"),
            ("Listing Date", "Fri, Jan 16, 2026"),
        ]);
        assert_eq!(
            extract_date(&d, &["Listing Date", "Listing"], Pick::First, false),
            Some(ymd(2026, 1, 16))
        );
    }

    #[test]
    fn absent_labels_yield_none() {
        let d = table(&[("Issue Size", "₹100 Cr")]);
        assert_eq!(extract_date(&d, &["Refund Date", "Refund"], Pick::First, false), None);
    }
}
