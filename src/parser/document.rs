use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::parser::normalize::clean_text;

static CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());
static HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static BLOCKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p, li").unwrap());
static LIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static META_TAGS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").unwrap());
static PAGE_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static INLINE_LABELS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt, strong, b, h4, h5, h6").unwrap());

/// How a label/heading/link-text query matches visible text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Contains,
    ContainsCi,
}

impl MatchMode {
    fn matches(self, text: &str, label: &str) -> bool {
        match self {
            MatchMode::Exact => text == label,
            MatchMode::Contains => text.contains(label),
            MatchMode::ContainsCi => text.to_lowercase().contains(&label.to_lowercase()),
        }
    }
}

/// Stateless description of a field anchor; reusable across documents.
#[derive(Debug, Clone, Copy)]
pub struct LabelQuery<'a> {
    pub label: &'a str,
    pub mode: MatchMode,
}

impl<'a> LabelQuery<'a> {
    pub fn new(label: &'a str, mode: MatchMode) -> LabelQuery<'a> {
        LabelQuery { label, mode }
    }

    pub fn contains_ci(label: &'a str) -> LabelQuery<'a> {
        LabelQuery::new(label, MatchMode::ContainsCi)
    }
}

/// Raw text pulled from a located node, prior to normalization.
/// Always strings, never typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Text(String),
    List(Vec<String>),
    Url(String),
}

impl Fragment {
    pub fn text(&self) -> Option<&str> {
        match self {
            Fragment::Text(s) | Fragment::Url(s) => Some(s),
            Fragment::List(_) => None,
        }
    }
}

/// One parsed page. Every lookup is text-anchored: content is found by what
/// a human would read (a label, a heading, a link caption), never by CSS
/// class or id, because the site has no stable class/id scheme.
pub struct Document {
    html: Html,
}

impl Document {
    /// Total over all input: html5ever recovers from anything, so garbage
    /// yields a best-effort (possibly empty) tree rather than an error.
    pub fn parse(raw: &str) -> Document {
        Document {
            html: Html::parse_document(raw),
        }
    }

    /// True when the tree has no table cells, headings, anchors or text
    /// blocks to anchor on, i.e. nothing any lookup could ever match.
    pub fn is_degraded(&self) -> bool {
        self.html.select(&CELLS).next().is_none()
            && self.html.select(&HEADINGS).next().is_none()
            && self.html.select(&ANCHORS).next().is_none()
            && self.html.select(&BLOCKS).next().is_none()
    }

    /// Label/value lookup. Table rows first: a `td`/`th` whose text matches
    /// is the anchor and the next cell in the row is the value. Falls back
    /// to inline label anchors (`dt`, `strong`, card titles) with the next
    /// element sibling as the value block. First match in document order.
    pub fn label_value(&self, query: &LabelQuery) -> Option<Fragment> {
        for cell in self.html.select(&CELLS) {
            let label = clean_text(&elem_text(cell));
            if label.is_empty() || !query.mode.matches(&label, query.label) {
                continue;
            }
            let Some(next) = next_element(cell) else { continue };
            if !matches!(next.value().name(), "td" | "th") {
                continue;
            }
            let value = clean_text(&elem_text(next));
            if !value.is_empty() {
                return Some(Fragment::Text(value));
            }
        }

        for el in self.html.select(&INLINE_LABELS) {
            let label = clean_text(&elem_text(el));
            if label.is_empty() || !query.mode.matches(&label, query.label) {
                continue;
            }
            let Some(next) = next_element(el) else { continue };
            let value = clean_text(&elem_text(next));
            if !value.is_empty() {
                return Some(Fragment::Text(value));
            }
        }

        None
    }

    /// Items under a heading: `li` and `p` siblings up to the next heading
    /// of equal-or-higher level. `Some([])` when the heading exists with
    /// nothing under it; `None` when no heading matches.
    pub fn list_under_heading(&self, heading: &str, mode: MatchMode) -> Option<Fragment> {
        let h = self.find_heading(heading, mode)?;
        let level = heading_level(&h).unwrap_or(6);
        let mut items = Vec::new();
        for el in blocks_after(h, level) {
            match el.value().name() {
                "ul" | "ol" => collect_texts(el.select(&LIST_ITEMS), &mut items),
                "li" | "p" => {
                    let text = clean_text(&elem_text(el));
                    if !text.is_empty() {
                        items.push(text);
                    }
                }
                _ => {
                    let before = items.len();
                    collect_texts(el.select(&LIST_ITEMS), &mut items);
                    if items.len() == before {
                        collect_texts(el.select(&PARAGRAPHS), &mut items);
                    }
                }
            }
        }
        Some(Fragment::List(items))
    }

    /// Concatenated block text under a heading, same boundary rules as
    /// [`Self::list_under_heading`].
    pub fn section_under_heading(&self, heading: &str, mode: MatchMode) -> Option<Fragment> {
        let h = self.find_heading(heading, mode)?;
        let level = heading_level(&h).unwrap_or(6);
        let parts: Vec<String> = blocks_after(h, level)
            .into_iter()
            .map(|el| clean_text(&elem_text(el)))
            .filter(|t| !t.is_empty())
            .collect();
        Some(Fragment::Text(parts.join(" ")))
    }

    /// First anchor whose visible text matches; returns the raw `href`.
    pub fn link_by_text(&self, text: &str, mode: MatchMode) -> Option<Fragment> {
        self.link_by_text_excluding(text, mode, None)
    }

    /// Like [`Self::link_by_text`], skipping anchors whose caption also
    /// matches `exclude` (e.g. "RHP" must not land on a "DRHP" link).
    pub fn link_by_text_excluding(
        &self,
        text: &str,
        mode: MatchMode,
        exclude: Option<&str>,
    ) -> Option<Fragment> {
        for a in self.html.select(&ANCHORS) {
            let visible = clean_text(&elem_text(a));
            if visible.is_empty() || !mode.matches(&visible, text) {
                continue;
            }
            if exclude.is_some_and(|ex| mode.matches(&visible, ex)) {
                continue;
            }
            if let Some(href) = a.value().attr("href") {
                return Some(Fragment::Url(href.to_string()));
            }
        }
        None
    }

    /// `<meta property=… content=…>` lookup (also accepts `name=`).
    pub fn meta_content(&self, property: &str) -> Option<Fragment> {
        self.html.select(&META_TAGS).find_map(|m| {
            let v = m.value();
            let hit = v.attr("property") == Some(property) || v.attr("name") == Some(property);
            if hit {
                v.attr("content")
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| Fragment::Url(c.trim().to_string()))
            } else {
                None
            }
        })
    }

    /// Text of the first `<h1>`, the page's display name.
    pub fn page_heading(&self) -> Option<String> {
        let h1 = self.html.select(&PAGE_TITLE).next()?;
        let text = clean_text(&elem_text(h1));
        (!text.is_empty()).then_some(text)
    }

    fn find_heading(&self, heading: &str, mode: MatchMode) -> Option<ElementRef<'_>> {
        self.html
            .select(&HEADINGS)
            .find(|h| mode.matches(&clean_text(&elem_text(*h)), heading))
    }
}

fn elem_text(el: ElementRef) -> String {
    el.text().collect::<String>()
}

fn next_element<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

fn heading_level(el: &ElementRef) -> Option<u8> {
    match el.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn collect_texts<'a>(iter: impl Iterator<Item = ElementRef<'a>>, out: &mut Vec<String>) {
    for el in iter {
        let text = clean_text(&elem_text(el));
        if !text.is_empty() {
            out.push(text);
        }
    }
}

/// Element siblings following `heading`, stopping at the next heading of
/// equal-or-higher level. A heading with no element siblings at all climbs
/// to its parent and continues from there.
fn blocks_after<'a>(heading: ElementRef<'a>, level: u8) -> Vec<ElementRef<'a>> {
    let mut out = Vec::new();
    let mut saw_sibling = false;
    for node in heading.next_siblings() {
        let Some(el) = ElementRef::wrap(node) else { continue };
        saw_sibling = true;
        if heading_level(&el).is_some_and(|l| l <= level) {
            return out;
        }
        out.push(el);
    }
    if !saw_sibling {
        if let Some(parent) = heading.parent().and_then(ElementRef::wrap) {
            for node in parent.next_siblings() {
                let Some(el) = ElementRef::wrap(node) else { continue };
                if heading_level(&el).is_some_and(|l| l <= level) {
                    break;
                }
                out.push(el);
            }
        }
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        Document::parse(html)
    }

    #[test]
    fn label_value_next_cell() {
        let d = doc("<table><tr><td>Issue Size (₹ Cr)</td><td>₹1,538.12 Cr</td></tr></table>");
        let got = d.label_value(&LabelQuery::contains_ci("issue size"));
        assert_eq!(got, Some(Fragment::Text("₹1,538.12 Cr".into())));
    }

    #[test]
    fn label_value_th_label() {
        let d = doc("<table><tr><th>Face Value</th><td>₹10 per share</td></tr></table>");
        let got = d.label_value(&LabelQuery::contains_ci("Face Value"));
        assert_eq!(got, Some(Fragment::Text("₹10 per share".into())));
    }

    #[test]
    fn label_value_first_in_document_order() {
        let d = doc(
            "<table>\
             <tr><td>Price Band</td><td>₹95 to ₹100</td></tr>\
             <tr><td>Price Band Revision</td><td>none</td></tr>\
             </table>",
        );
        let got = d.label_value(&LabelQuery::contains_ci("Price Band"));
        assert_eq!(got, Some(Fragment::Text("₹95 to ₹100".into())));
    }

    #[test]
    fn label_value_exact_mode() {
        let d = doc("<table><tr><td>Issue Size (₹ Cr)</td><td>₹100 Cr</td></tr></table>");
        assert_eq!(d.label_value(&LabelQuery::new("Issue Size", MatchMode::Exact)), None);
        assert_eq!(
            d.label_value(&LabelQuery::new("Issue Size (₹ Cr)", MatchMode::Exact)),
            Some(Fragment::Text("₹100 Cr".into()))
        );
    }

    #[test]
    fn label_value_contains_is_case_sensitive() {
        let d = doc("<table><tr><td>ISSUE SIZE</td><td>₹100 Cr</td></tr></table>");
        assert_eq!(d.label_value(&LabelQuery::new("Issue Size", MatchMode::Contains)), None);
        assert!(d.label_value(&LabelQuery::contains_ci("Issue Size")).is_some());
    }

    #[test]
    fn label_value_inline_fallback() {
        let d = doc("<dl><dt>Registrar</dt><dd>Link Intime India Pvt Ltd</dd></dl>");
        let got = d.label_value(&LabelQuery::contains_ci("Registrar"));
        assert_eq!(got, Some(Fragment::Text("Link Intime India Pvt Ltd".into())));
    }

    #[test]
    fn label_value_card_fallback() {
        let d = doc("<div><h5>Issue Open Date</h5><p>Fri, Jan 9, 2026</p></div>");
        let got = d.label_value(&LabelQuery::contains_ci("Issue Open"));
        assert_eq!(got, Some(Fragment::Text("Fri, Jan 9, 2026".into())));
    }

    #[test]
    fn label_value_absent() {
        let d = doc("<table><tr><td>Issue Size</td><td>₹100 Cr</td></tr></table>");
        assert_eq!(d.label_value(&LabelQuery::contains_ci("Lot Size")), None);
    }

    #[test]
    fn list_under_heading_items() {
        let d = doc(
            "<h3>Strengths</h3><ul><li>Brand recall</li><li>Wide network</li>\
             <li>Repeat orders</li></ul><h3>Weaknesses</h3><ul><li>Thin margins</li></ul>",
        );
        let got = d.list_under_heading("Strengths", MatchMode::ContainsCi);
        assert_eq!(
            got,
            Some(Fragment::List(vec![
                "Brand recall".into(),
                "Wide network".into(),
                "Repeat orders".into(),
            ]))
        );
    }

    #[test]
    fn list_under_heading_stops_at_boundary() {
        let d = doc(
            "<h3>Strengths</h3><ul><li>One</li></ul><h3>Weaknesses</h3><ul><li>Two</li></ul>",
        );
        let got = d.list_under_heading("Strengths", MatchMode::ContainsCi);
        assert_eq!(got, Some(Fragment::List(vec!["One".into()])));
    }

    #[test]
    fn list_under_heading_empty_section() {
        let d = doc("<h3>Strengths</h3><h3>Weaknesses</h3><ul><li>Thin margins</li></ul>");
        let got = d.list_under_heading("Strengths", MatchMode::ContainsCi);
        assert_eq!(got, Some(Fragment::List(vec![])));
    }

    #[test]
    fn list_under_heading_missing() {
        let d = doc("<h3>Weaknesses</h3><ul><li>Thin margins</li></ul>");
        assert_eq!(d.list_under_heading("Strengths", MatchMode::ContainsCi), None);
    }

    #[test]
    fn list_under_heading_paragraph_items() {
        let d = doc("<h3>Promoters</h3><p>A Sharma</p><p>B Sharma</p><h3>Other</h3>");
        let got = d.list_under_heading("Promoters", MatchMode::ContainsCi);
        assert_eq!(
            got,
            Some(Fragment::List(vec!["A Sharma".into(), "B Sharma".into()]))
        );
    }

    #[test]
    fn list_under_heading_climbs_parent() {
        let d = doc(
            "<div><h3>Strengths</h3></div><ul><li>Brand recall</li></ul><h3>Next</h3>",
        );
        let got = d.list_under_heading("Strengths", MatchMode::ContainsCi);
        assert_eq!(got, Some(Fragment::List(vec!["Brand recall".into()])));
    }

    #[test]
    fn section_under_heading_concatenates() {
        let d = doc("<h2>About</h2><p>Founded 1998.</p><p>Makes snacks.</p><h2>Contact</h2>");
        let got = d.section_under_heading("About", MatchMode::ContainsCi);
        assert_eq!(got, Some(Fragment::Text("Founded 1998. Makes snacks.".into())));
    }

    #[test]
    fn link_by_text_href() {
        let d = doc(r##"<a href="/x">Reports</a><a href="https://maple.in/">Website</a>"##);
        let got = d.link_by_text("Website", MatchMode::ContainsCi);
        assert_eq!(got, Some(Fragment::Url("https://maple.in/".into())));
    }

    #[test]
    fn meta_content_property() {
        let d = doc(r#"<head><meta property="og:image" content="https://m.in/logo.png"></head>"#);
        let got = d.meta_content("og:image");
        assert_eq!(got, Some(Fragment::Url("https://m.in/logo.png".into())));
        assert_eq!(d.meta_content("og:url"), None);
    }

    #[test]
    fn page_heading_text() {
        let d = doc("<h1>Maple Foods IPO</h1><h1>Second</h1>");
        assert_eq!(d.page_heading(), Some("Maple Foods IPO".into()));
    }

    #[test]
    fn degraded_inputs() {
        assert!(doc("").is_degraded());
        assert!(doc("just some stray text, no markup").is_degraded());
        assert!(doc("\u{0}\u{1}\u{2}binary-ish junk").is_degraded());
        assert!(!doc("<p>hello</p>").is_degraded());
        assert!(!doc("<table><tr><td>x</td></tr></table>").is_degraded());
    }
}
