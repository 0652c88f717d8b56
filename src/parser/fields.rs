use crate::parser::document::MatchMode;

/// Declared type of a record field; the validator checks non-null values
/// against this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Int,
    Date,
    Text,
    TextList,
    Url,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Float => "float",
            FieldKind::Int => "int",
            FieldKind::Date => "date",
            FieldKind::Text => "text",
            FieldKind::TextList => "list",
            FieldKind::Url => "url",
        }
    }
}

/// Which end of a multi-valued cell to take (price bands, date ranges).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    First,
    Last,
}

/// Where a field's raw fragment comes from. One primitive per field, fixed
/// at definition time; the whole mapping is data, not code.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// Labeled table cell → sibling value cell.
    Label { label: &'static str, mode: MatchMode },
    /// Labeled cell holding a numeric range; `pick` selects the run.
    Band { label: &'static str, pick: Pick },
    /// Date behind any of several labels; `pick` resolves ranges and
    /// `combined` allows the merged open/close cell as a fallback.
    DateLabels {
        labels: &'static [&'static str],
        pick: Pick,
        combined: bool,
    },
    /// List items under any of several headings.
    HeadingList {
        headings: &'static [&'static str],
        filtered: bool,
    },
    /// Anchor by visible text; `exclude` rejects look-alike captions.
    Link {
        text: &'static str,
        exclude: Option<&'static str>,
    },
    /// Anchor by visible text, falling back to the labeled cell.
    LinkOrLabel {
        text: &'static str,
        label: &'static str,
    },
    /// Document metadata tag.
    Meta { property: &'static str },
    /// The page's `<h1>`.
    PageName,
    /// Numeric tail of the source URL.
    UrlId,
    /// Path segment after the offering prefix in the source URL.
    UrlSlug,
    /// Site-specific pulls with their own fallback chains.
    AboutCompany,
    Promoters,
    LeadManagers,
    Sector,
    TentativeFlag,
}

pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub source: Source,
}

const fn label(name: &'static str, kind: FieldKind, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        source: Source::Label {
            label,
            mode: MatchMode::ContainsCi,
        },
    }
}

const fn band(name: &'static str, pick: Pick) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Float,
        source: Source::Band {
            label: "Price Band",
            pick,
        },
    }
}

const fn date(
    name: &'static str,
    labels: &'static [&'static str],
    pick: Pick,
    combined: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Date,
        source: Source::DateLabels {
            labels,
            pick,
            combined,
        },
    }
}

const fn listing(name: &'static str, headings: &'static [&'static str], filtered: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::TextList,
        source: Source::HeadingList { headings, filtered },
    }
}

const fn link(name: &'static str, text: &'static str, exclude: Option<&'static str>) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Url,
        source: Source::Link { text, exclude },
    }
}

const fn special(name: &'static str, kind: FieldKind, source: Source) -> FieldSpec {
    FieldSpec { name, kind, source }
}

const OPEN_LABELS: &[&str] = &["Issue Open Date", "Issue Open", "IPO Open", "Open Date"];
const CLOSE_LABELS: &[&str] = &["Issue Close Date", "Issue Close", "IPO Close", "Close Date"];
const ALLOTMENT_LABELS: &[&str] = &["Allotment Date", "Basis of Allotment", "Allotment"];
const REFUND_LABELS: &[&str] = &["Refund Date", "Refund"];
const LISTING_LABELS: &[&str] = &["Listing Date", "Tentative Listing Date", "Listing"];
const BOA_LABELS: &[&str] = &["Basis of Allotment", "BOA"];
const COS_LABELS: &[&str] = &["Credit of Shares", "Credit Date"];

/// The fixed field table, in record order. Extraction never invents or
/// drops a field at run time; every entry resolves independently of every
/// other entry.
pub static FIELDS: &[FieldSpec] = &[
    special("external_id", FieldKind::Int, Source::UrlId),
    special("slug", FieldKind::Text, Source::UrlSlug),
    special("name", FieldKind::Text, Source::PageName),
    label("category", FieldKind::Text, "Category"),
    label("exchange", FieldKind::Text, "Exchange"),
    label("issue_size_crore", FieldKind::Float, "Issue Size"),
    label("fresh_issue_crore", FieldKind::Float, "Fresh Issue"),
    label("ofs_issue_crore", FieldKind::Float, "Offer for Sale"),
    label("market_maker_reserved_crore", FieldKind::Float, "Market Maker"),
    label("face_value", FieldKind::Float, "Face Value"),
    label("issue_type", FieldKind::Text, "Issue Type"),
    band("issue_price_low", Pick::First),
    band("issue_price_high", Pick::Last),
    label("lot_size", FieldKind::Int, "Lot Size"),
    label("single_lot_price", FieldKind::Float, "Lot Investment"),
    label("small_hni_lot", FieldKind::Int, "Small HNI"),
    label("big_hni_lot", FieldKind::Int, "Big HNI"),
    date("issue_open_date", OPEN_LABELS, Pick::First, true),
    date("issue_close_date", CLOSE_LABELS, Pick::Last, true),
    date("allotment_date", ALLOTMENT_LABELS, Pick::First, false),
    date("refund_date", REFUND_LABELS, Pick::First, false),
    date("listing_date", LISTING_LABELS, Pick::First, false),
    date("boa_date", BOA_LABELS, Pick::First, false),
    date("cos_date", COS_LABELS, Pick::First, false),
    label("promoter_holding_pre", FieldKind::Float, "Promoter Holding"),
    label("promoter_holding_post", FieldKind::Float, "Post Issue"),
    special(
        "website",
        FieldKind::Url,
        Source::LinkOrLabel {
            text: "Website",
            label: "Website",
        },
    ),
    special("sector", FieldKind::Text, Source::Sector),
    label("bse_code", FieldKind::Text, "BSE Code"),
    label("nse_code", FieldKind::Text, "NSE Code"),
    special("about_company", FieldKind::TextList, Source::AboutCompany),
    listing("strengths", &["Strengths", "Strength"], false),
    listing("weaknesses", &["Weaknesses", "Weakness"], false),
    listing("opportunities", &["Opportunities", "Opportunity"], false),
    listing("threats", &["Threats", "Threat"], false),
    listing("products", &["Products", "Product"], false),
    listing("services", &["Services", "Service"], true),
    special("promoters", FieldKind::TextList, Source::Promoters),
    special("lead_managers", FieldKind::TextList, Source::LeadManagers),
    link("drhp_url", "DRHP", None),
    link("rhp_url", "RHP", Some("DRHP")),
    link("final_prospectus_url", "Final Prospectus", None),
    link("anchor_list_url", "Anchor", None),
    special("logo_url", FieldKind::Url, Source::Meta { property: "og:image" }),
    special("is_tentative", FieldKind::Int, Source::TentativeFlag),
    label("rating", FieldKind::Float, "Rating"),
    label("listing_price", FieldKind::Float, "Listing Price"),
];

// ── Tests ──
