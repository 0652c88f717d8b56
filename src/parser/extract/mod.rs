pub mod dates;
pub mod lists;

use crate::parser::document::{Document, Fragment, LabelQuery, MatchMode};
use crate::parser::fields::{FieldKind, FieldSpec, Pick, Source, FIELDS};
use crate::parser::normalize::{parse_date, parse_float, parse_floats, parse_int};
use crate::record::{Extraction, Record, Value};

/// Fold the field table over one document. Each field resolves on its own:
/// a missing anchor or an unparseable value becomes `Null` for that field
/// and nothing else. Only a document with no usable tree degrades the whole
/// record, and that is a flag on the result, never a fault.
pub fn extract_record(doc: &Document, url: &str) -> Extraction {
    if doc.is_degraded() {
        return Extraction {
            record: Record::all_null(),
            degraded: true,
        };
    }

    let values = FIELDS
        .iter()
        .map(|spec| extract_field(doc, url, spec))
        .collect();

    Extraction {
        record: Record::from_values(values),
        degraded: false,
    }
}

/// Resolve one field: pull the raw fragment with the field's primitive,
/// then convert with the normalizer for its declared kind.
pub(crate) fn extract_field(doc: &Document, url: &str, spec: &FieldSpec) -> Value {
    let fragment = match spec.source {
        Source::Label { label, mode } => doc.label_value(&LabelQuery::new(label, mode)),
        Source::Band { label, pick } => return band_value(doc, label, pick),
        Source::DateLabels {
            labels,
            pick,
            combined,
        } => {
            return dates::extract_date(doc, labels, pick, combined)
                .map(Value::Date)
                .unwrap_or(Value::Null)
        }
        Source::HeadingList { headings, filtered } => {
            lists::heading_list(doc, headings, filtered).map(Fragment::List)
        }
        Source::Link { text, exclude } => {
            doc.link_by_text_excluding(text, MatchMode::ContainsCi, exclude)
        }
        Source::LinkOrLabel { text, label } => doc
            .link_by_text(text, MatchMode::ContainsCi)
            .or_else(|| doc.label_value(&LabelQuery::contains_ci(label))),
        Source::Meta { property } => doc.meta_content(property),
        Source::PageName => doc.page_heading().map(Fragment::Text),
        Source::UrlId => return url_external_id(url).map(Value::Int).unwrap_or(Value::Null),
        Source::UrlSlug => return url_slug(url).map(Value::Text).unwrap_or(Value::Null),
        Source::AboutCompany => lists::about_company(doc).map(Fragment::List),
        Source::Promoters => lists::promoters(doc).map(Fragment::List),
        Source::LeadManagers => lists::lead_managers(doc).map(Fragment::List),
        Source::Sector => lists::sector(doc).map(Fragment::Text),
        Source::TentativeFlag => return tentative_flag(doc),
    };
    normalize_fragment(fragment, spec.kind)
}

fn normalize_fragment(fragment: Option<Fragment>, kind: FieldKind) -> Value {
    let Some(fragment) = fragment else {
        return Value::Null;
    };
    match (kind, fragment) {
        (FieldKind::Float, Fragment::Text(t)) => {
            parse_float(&t).map(Value::Float).unwrap_or(Value::Null)
        }
        (FieldKind::Int, Fragment::Text(t)) => parse_int(&t).map(Value::Int).unwrap_or(Value::Null),
        (FieldKind::Date, Fragment::Text(t)) => {
            parse_date(&t).map(Value::Date).unwrap_or(Value::Null)
        }
        (FieldKind::Text, Fragment::Text(t)) => {
            if t.is_empty() {
                Value::Null
            } else {
                Value::Text(t)
            }
        }
        (FieldKind::TextList, Fragment::List(items)) => Value::List(items),
        (FieldKind::Url, Fragment::Url(u)) | (FieldKind::Url, Fragment::Text(u)) => {
            if u.is_empty() {
                Value::Null
            } else {
                Value::Url(u)
            }
        }
        _ => Value::Null,
    }
}

/// "₹95 to ₹100 per share" → 95.0 (low) or 100.0 (high). A single-price
/// band yields the same value for both ends.
fn band_value(doc: &Document, label: &str, pick: Pick) -> Value {
    let Some(Fragment::Text(value)) = doc.label_value(&LabelQuery::contains_ci(label)) else {
        return Value::Null;
    };
    let runs = parse_floats(&value);
    let chosen = match pick {
        Pick::First => runs.first(),
        Pick::Last => runs.last(),
    };
    chosen.map(|v| Value::Float(*v)).unwrap_or(Value::Null)
}

/// Set when either anchor (page name, Status cell) exists; null when the
/// document carries neither.
fn tentative_flag(doc: &Document) -> Value {
    let name = doc.page_heading();
    let status = doc
        .label_value(&LabelQuery::contains_ci("Status"))
        .and_then(|f| f.text().map(String::from));
    if name.is_none() && status.is_none() {
        return Value::Null;
    }
    let hit = name.as_deref().unwrap_or("").contains("Tentative")
        || status.as_deref().unwrap_or("").contains("Tentative");
    Value::Int(hit as i64)
}

fn url_external_id(url: &str) -> Option<i64> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

fn url_slug(url: &str) -> Option<String> {
    let tail = url.split("/ipo/").nth(1)?;
    let slug = tail.split('/').next()?;
    (!slug.is_empty()).then(|| slug.to_string())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PAGE_URL: &str = "https://www.chittorgarh.com/ipo/maple-foods-ipo/9981/";

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/maple_foods.html").unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn minimal_document() {
        let html = "<table><tr><td>Issue Size</td><td>₹1,538.12 Cr</td></tr></table>";
        let doc = Document::parse(html);
        let out = extract_record(&doc, "");
        assert!(!out.degraded);
        assert_eq!(out.record.get("issue_size_crore"), Some(&Value::Float(1538.12)));
        for (name, value) in out.record.iter() {
            if name != "issue_size_crore" {
                assert!(value.is_null(), "expected null for {}, got {:?}", name, value);
            }
        }
    }

    #[test]
    fn totality_over_arbitrary_input() {
        for input in ["", "   ", "<<<>>> not html", "\u{0}\u{1}garbage", "<p>no labels</p>"] {
            let doc = Document::parse(input);
            let out = extract_record(&doc, "");
            assert_eq!(out.record.len(), FIELDS.len());
            assert!(out.record.values().iter().all(Value::is_null));
        }
    }

    #[test]
    fn degraded_only_without_usable_tree() {
        assert!(extract_record(&Document::parse(""), "").degraded);
        assert!(extract_record(&Document::parse("plain text"), "").degraded);
        assert!(!extract_record(&Document::parse("<p>well-formed, no labels</p>"), "").degraded);
    }

    #[test]
    fn order_independence() {
        let html = fixture();
        let doc = Document::parse(&html);
        let forward = extract_record(&doc, PAGE_URL).record;
        let mut reversed: Vec<Value> = FIELDS
            .iter()
            .rev()
            .map(|spec| extract_field(&doc, PAGE_URL, spec))
            .collect();
        reversed.reverse();
        assert_eq!(forward, Record::from_values(reversed));
    }

    #[test]
    fn repeated_runs_identical() {
        let html = fixture();
        let doc = Document::parse(&html);
        let a = extract_record(&doc, PAGE_URL);
        let b = extract_record(&doc, PAGE_URL);
        assert_eq!(a, b);
    }

    #[test]
    fn fixture_identity_fields() {
        let doc = Document::parse(&fixture());
        let r = extract_record(&doc, PAGE_URL).record;
        assert_eq!(r.get("external_id"), Some(&Value::Int(9981)));
        assert_eq!(r.get("slug"), Some(&Value::Text("maple-foods-ipo".into())));
        assert_eq!(r.get("name"), Some(&Value::Text("Maple Foods IPO".into())));
        assert_eq!(r.get("is_tentative"), Some(&Value::Int(0)));
    }

    #[test]
    fn fixture_issue_numbers() {
        let doc = Document::parse(&fixture());
        let r = extract_record(&doc, PAGE_URL).record;
        assert_eq!(r.get("issue_size_crore"), Some(&Value::Float(1538.12)));
        assert_eq!(r.get("fresh_issue_crore"), Some(&Value::Float(1100.0)));
        assert_eq!(r.get("ofs_issue_crore"), Some(&Value::Float(438.12)));
        assert_eq!(r.get("face_value"), Some(&Value::Float(10.0)));
        assert_eq!(r.get("issue_price_low"), Some(&Value::Float(95.0)));
        assert_eq!(r.get("issue_price_high"), Some(&Value::Float(100.0)));
        assert_eq!(r.get("lot_size"), Some(&Value::Int(120)));
        assert_eq!(r.get("single_lot_price"), Some(&Value::Float(12000.0)));
        assert_eq!(r.get("small_hni_lot"), Some(&Value::Int(15)));
        assert_eq!(r.get("big_hni_lot"), Some(&Value::Int(84)));
        assert_eq!(r.get("promoter_holding_pre"), Some(&Value::Float(84.5)));
        assert_eq!(r.get("promoter_holding_post"), Some(&Value::Float(62.3)));
        assert_eq!(r.get("rating"), Some(&Value::Float(4.5)));
    }

    #[test]
    fn fixture_dates() {
        let doc = Document::parse(&fixture());
        let r = extract_record(&doc, PAGE_URL).record;
        assert_eq!(r.get("issue_open_date"), Some(&ymd(2026, 1, 9)));
        assert_eq!(r.get("issue_close_date"), Some(&ymd(2026, 1, 13)));
        assert_eq!(r.get("allotment_date"), Some(&ymd(2026, 1, 14)));
        assert_eq!(r.get("refund_date"), Some(&ymd(2026, 1, 15)));
        assert_eq!(r.get("listing_date"), Some(&ymd(2026, 1, 16)));
        assert_eq!(r.get("boa_date"), Some(&ymd(2026, 1, 14)));
        assert_eq!(r.get("cos_date"), Some(&ymd(2026, 1, 15)));
    }

    #[test]
    fn fixture_lists() {
        let doc = Document::parse(&fixture());
        let r = extract_record(&doc, PAGE_URL).record;
        assert_eq!(
            r.get("strengths"),
            Some(&Value::List(vec![
                "Established brand with three decades of recall".into(),
                "Pan-India cold-chain distribution network".into(),
                "Consistent repeat orders from institutional buyers".into(),
            ]))
        );
        assert_eq!(
            r.get("weaknesses"),
            Some(&Value::List(vec![
                "Margins depend on volatile commodity prices".into(),
                "Revenue concentrated in two states".into(),
            ]))
        );
        assert_eq!(
            r.get("promoters"),
            Some(&Value::List(vec!["Anil Sharma".into(), "Bina Sharma".into()]))
        );
        assert_eq!(
            r.get("lead_managers"),
            Some(&Value::List(vec![
                "Apex Securities Ltd".into(),
                "Crestline Capital Advisors Ltd".into(),
            ]))
        );
        // Headings absent from the page entirely.
        assert_eq!(r.get("opportunities"), Some(&Value::Null));
        assert_eq!(r.get("threats"), Some(&Value::Null));
        assert_eq!(r.get("services"), Some(&Value::Null));
    }

    #[test]
    fn fixture_links_and_meta() {
        let doc = Document::parse(&fixture());
        let r = extract_record(&doc, PAGE_URL).record;
        assert_eq!(r.get("website"), Some(&Value::Url("https://www.maplefoods.in/".into())));
        assert_eq!(
            r.get("drhp_url"),
            Some(&Value::Url("https://www.maplefoods.in/drhp.pdf".into()))
        );
        assert_eq!(
            r.get("rhp_url"),
            Some(&Value::Url("https://www.maplefoods.in/rhp.pdf".into()))
        );
        assert_eq!(
            r.get("anchor_list_url"),
            Some(&Value::Url("https://www.maplefoods.in/anchor.pdf".into()))
        );
        assert_eq!(
            r.get("logo_url"),
            Some(&Value::Url("https://www.maplefoods.in/logo.png".into()))
        );
        assert_eq!(r.get("final_prospectus_url"), Some(&Value::Null));
    }

    #[test]
    fn fixture_text_fields() {
        let doc = Document::parse(&fixture());
        let r = extract_record(&doc, PAGE_URL).record;
        assert_eq!(r.get("category"), Some(&Value::Text("Mainboard IPO".into())));
        assert_eq!(r.get("exchange"), Some(&Value::Text("BSE & NSE".into())));
        assert_eq!(r.get("issue_type"), Some(&Value::Text("Book Built Issue".into())));
        assert_eq!(r.get("sector"), Some(&Value::Text("Food Processing".into())));
        assert_eq!(r.get("bse_code"), Some(&Value::Text("544321".into())));
        assert_eq!(r.get("nse_code"), Some(&Value::Text("MAPLE".into())));
    }

    #[test]
    fn url_fields_without_context() {
        let doc = Document::parse(&fixture());
        let r = extract_record(&doc, "").record;
        assert_eq!(r.get("external_id"), Some(&Value::Null));
        assert_eq!(r.get("slug"), Some(&Value::Null));
        // Document-derived fields are unaffected by the missing identifier.
        assert_eq!(r.get("issue_size_crore"), Some(&Value::Float(1538.12)));
    }
}
