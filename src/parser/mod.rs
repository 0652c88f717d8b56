pub mod document;
pub mod extract;
pub mod fields;
pub mod normalize;

use crate::record::Extraction;

/// Two-pass pipeline: raw HTML → document tree → field fold.
/// Total over all input: any string yields a full-size record, possibly
/// all-null with the degraded flag set.
pub fn process_page(html: &str, url: &str) -> Extraction {
    let doc = document::Document::parse(html);
    extract::extract_record(&doc, url)
}

// ── Tests ──
