use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::document::{Document, Fragment, LabelQuery, MatchMode};

static NAME_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;]\s*|\s+and\s+").unwrap());

/// Navigation and broker chrome that leaks into heading sections on the site.
const NAV_NOISE: &[&str] = &[
    "IPO Reports",
    "eBook",
    "IPO Articles",
    "IPO Message Board",
    "IPO Guide",
    "Broker",
    "Review",
    "Report",
    "Compare",
    "Angel One",
    "Kotak",
    "Motilal",
    "Zerodha",
    "Upstox",
    "5Paisa",
    "Indiabulls",
    "More Brokers",
    "List of",
    "Performance",
];

const LEAD_MANAGER_NOISE: &[&str] = &[
    "List of Issues",
    "No. of Issues",
    "Performance",
    "Report",
    "Market Maker",
    "Registrar",
    "Broker",
];

const FIRM_MARKERS: &[&str] = &[
    "Ltd",
    "Limited",
    "Securities",
    "Capital",
    "Advisors",
    "Advisory",
    "Bank",
];

const SECTOR_KEYWORDS: &[&str] = &[
    "Energy",
    "Technology",
    "Finance",
    "Healthcare",
    "Manufacturing",
    "Logistics",
    "Infrastructure",
    "Real Estate",
    "Telecom",
    "FMCG",
];

/// Items under the first heading variant that exists. `Some([])` when a
/// heading exists with nothing under it (or everything filtered away).
pub fn heading_list(doc: &Document, headings: &[&str], filtered: bool) -> Option<Vec<String>> {
    for heading in headings {
        if let Some(Fragment::List(items)) = doc.list_under_heading(heading, MatchMode::ContainsCi) {
            let items = if filtered {
                items.into_iter().filter(|t| !is_noise(t)).collect()
            } else {
                items
            };
            return Some(items);
        }
    }
    None
}

fn is_noise(text: &str) -> bool {
    NAV_NOISE.iter().any(|k| text.contains(k))
}

/// About section: list items or paragraphs, keeping only substantial prose
/// (the section shares markup with navigation link blocks).
pub fn about_company(doc: &Document) -> Option<Vec<String>> {
    for heading in ["About", "Company Overview"] {
        if let Some(Fragment::List(items)) = doc.list_under_heading(heading, MatchMode::ContainsCi) {
            let kept = items
                .into_iter()
                .filter(|t| t.len() > 20 && !is_noise(t))
                .collect();
            return Some(kept);
        }
    }
    None
}

/// Promoter names from the heading list, falling back to the labeled cell
/// split on the usual separators ("A Sharma, B Sharma and C Sharma").
pub fn promoters(doc: &Document) -> Option<Vec<String>> {
    let from_heading = heading_list(doc, &["Promoters", "Promoter"], false);
    if let Some(items) = &from_heading {
        if !items.is_empty() {
            return from_heading;
        }
    }

    if let Some(Fragment::Text(value)) = doc.label_value(&LabelQuery::contains_ci("Promoters")) {
        let parts: Vec<String> = NAME_SPLIT_RE
            .split(&value)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if !parts.is_empty() {
            return Some(parts);
        }
    }

    from_heading
}

/// Lead manager firms. Entries carry report-link suffixes like
/// "Apex Securities Ltd (Past 12 IPOs)" — cut at the parenthesis and keep
/// only names that look like firms.
pub fn lead_managers(doc: &Document) -> Option<Vec<String>> {
    if let Some(items) = heading_list(doc, &["Lead Manager"], false) {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for raw in items {
            if LEAD_MANAGER_NOISE.iter().any(|k| raw.contains(k)) {
                continue;
            }
            let name = clean_manager_name(&raw);
            if name.len() > 3
                && FIRM_MARKERS.iter().any(|m| name.contains(m))
                && seen.insert(name.clone())
            {
                out.push(name);
            }
        }
        return Some(out);
    }

    if let Some(Fragment::Text(value)) = doc.label_value(&LabelQuery::contains_ci("Lead Manager")) {
        let parts: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && !LEAD_MANAGER_NOISE.iter().any(|k| s.contains(k)))
            .map(String::from)
            .collect();
        return Some(parts);
    }

    None
}

fn clean_manager_name(raw: &str) -> String {
    match raw.find('(') {
        Some(i) => raw[..i].trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Sector from the labeled cell, else a keyword scan of the About prose.
pub fn sector(doc: &Document) -> Option<String> {
    if let Some(Fragment::Text(s)) = doc.label_value(&LabelQuery::contains_ci("Sector")) {
        return Some(s);
    }
    let Some(Fragment::Text(about)) = doc.section_under_heading("About", MatchMode::ContainsCi)
    else {
        return None;
    };
    let hay = about.to_lowercase();
    SECTOR_KEYWORDS
        .iter()
        .find(|k| hay.contains(&k.to_lowercase()))
        .map(|k| k.to_string())
}

// ── Tests ──
