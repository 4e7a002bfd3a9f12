use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Section tag the insights endpoint uses for price history.
pub const PRICE_CHANGE_SECTION: &str = "priceChangeHistoryDetail";

/// Attribute marking an injected fragment on the page.
pub const FRAGMENT_MARKER_ATTR: &str = "data-sse-id";

/// Suffix of every fragment marker value, `{identifier}-price-history`.
pub const FRAGMENT_TAG_SUFFIX: &str = "-price-history";

/// The three kinds of page the pipeline knows how to enrich.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    SearchResults,
    SavedItems,
    Detail,
}

impl PageType {
    pub const ALL: [PageType; 3] = [
        PageType::SearchResults,
        PageType::SavedItems,
        PageType::Detail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::SearchResults => "search_results",
            PageType::SavedItems => "saved_items",
            PageType::Detail => "detail",
        }
    }

    /// 依網址路徑判斷頁面類型，detail 頁必須先於搜尋結果判斷
    pub fn detect(url: &Url) -> Option<PageType> {
        let path = url.path();
        if path.trim_end_matches('/') == "/saved-items" {
            Some(PageType::SavedItems)
        } else if path.contains("/cars/details/") {
            Some(PageType::Detail)
        } else if path.contains("/cars/") {
            Some(PageType::SearchResults)
        } else {
            None
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque listing identifier, e.g. `SSE-AD-12345`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Marker value recorded on the rendered fragment root.
    pub fn fragment_tag(&self) -> String {
        format!("{}{}", self.0, FRAGMENT_TAG_SUFFIX)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw insights response; only `items` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsResponse {
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeSection {
    #[serde(rename = "priceTimeLine", default)]
    pub price_time_line: Option<PriceTimeLine>,
    #[serde(rename = "priceUpdate", default)]
    pub price_update: Option<PriceUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTimeLine {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<TimelineItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    #[serde(default)]
    pub subtitle: Option<String>,
}

/// Parsed insights data for one listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentResult {
    pub price_change: Option<PriceChangeSection>,
}

impl EnrichmentResult {
    pub fn none() -> Self {
        Self { price_change: None }
    }

    pub fn with_section(section: PriceChangeSection) -> Self {
        Self {
            price_change: Some(section),
        }
    }
}

/// Markup ready to be attached next to a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFragment {
    pub identifier: Identifier,
    pub full_width: bool,
    /// Inner markup of each `<li>`, summary line first.
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingFailure {
    pub identifier: Identifier,
    pub kind: String,
    pub message: String,
}

/// Outcome of one pipeline run over a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub page_type: PageType,
    pub discovered: usize,
    pub attached: usize,
    pub skipped_no_identifier: usize,
    pub skipped_already_enriched: usize,
    pub without_history: usize,
    pub failures: Vec<ListingFailure>,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            discovered: 0,
            attached: 0,
            skipped_no_identifier: 0,
            skipped_already_enriched: 0,
            without_history: 0,
            failures: Vec::new(),
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn fetched(&self) -> usize {
        self.attached + self.without_history + self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_tag() {
        let id = Identifier::new("SSE-AD-12345");
        assert_eq!(id.fragment_tag(), "SSE-AD-12345-price-history");
        assert!(id.fragment_tag().ends_with(FRAGMENT_TAG_SUFFIX));
        assert_eq!(id.to_string(), "SSE-AD-12345");
    }

    #[test]
    fn test_section_deserializes_camel_case_fields() {
        let section: PriceChangeSection = serde_json::from_value(serde_json::json!({
            "sectionType": "priceChangeHistoryDetail",
            "priceTimeLine": {
                "title": "Total price decrease $500",
                "items": [{"key": "10 Jan", "value": "$20,000"}]
            }
        }))
        .unwrap();

        let timeline = section.price_time_line.unwrap();
        assert_eq!(timeline.title.as_deref(), Some("Total price decrease $500"));
        assert_eq!(timeline.items.unwrap().len(), 1);
        assert!(section.price_update.is_none());
    }

    #[test]
    fn test_page_type_detection() {
        let detect = |s: &str| PageType::detect(&Url::parse(s).unwrap());
        assert_eq!(
            detect("https://www.carsales.com.au/cars/toyota/corolla/"),
            Some(PageType::SearchResults)
        );
        assert_eq!(
            detect("https://www.carsales.com.au/cars/details/2019-toyota-corolla/SSE-AD-12345/"),
            Some(PageType::Detail)
        );
        assert_eq!(
            detect("https://www.carsales.com.au/saved-items"),
            Some(PageType::SavedItems)
        );
        assert_eq!(detect("https://www.carsales.com.au/research/"), None);
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport::new(PageType::SearchResults);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["page_type"], "search_results");
        assert_eq!(json["attached"], 0);
        assert_eq!(report.fetched(), 0);
    }
}
