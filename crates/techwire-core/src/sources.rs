use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a source produces when fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Scrape,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Rss => "rss",
            SourceKind::Scrape => "scrape",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rss" => Some(SourceKind::Rss),
            "scrape" => Some(SourceKind::Scrape),
            _ => None,
        }
    }
}

/// A registered content source (RSS feed or scrape target)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub kind: SourceKind,
    pub category: Option<String>,
    pub is_active: bool,
    pub fetch_frequency_minutes: u32,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub scrape_plan: Option<ScrapePlan>,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to register a new source
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    pub kind: SourceKind,
    pub category: Option<String>,
    pub fetch_frequency_minutes: u32,
    pub scrape_plan: Option<ScrapePlan>,
}

/// Data-driven extraction strategy for a scrape source.
///
/// Every field is a CSS selector string; a missing or non-matching selector
/// simply omits the corresponding product field. New source configurations
/// need no code changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapePlan {
    /// Explicit product page URLs (absolute or relative to the source URL)
    #[serde(default)]
    pub product_urls: Vec<String>,
    /// A listing page to harvest product links from, used when
    /// `product_urls` is empty
    #[serde(default)]
    pub product_list_url: Option<String>,
    /// Selector for product links on the listing page
    #[serde(default)]
    pub product_link: Option<String>,
    /// Element expected on a fully rendered product page; absence is logged
    /// but never fails the page
    #[serde(default)]
    pub ready_selector: Option<String>,
    #[serde(default)]
    pub selectors: FieldSelectors,
    /// Catalog categories to attach to every product from this source
    #[serde(default)]
    pub categories: Vec<String>,
}

/// CSS selectors for the individual product fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSelectors {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Rows of the specification table
    #[serde(default)]
    pub spec_row: Option<String>,
    /// Key cell within a spec row
    #[serde(default)]
    pub spec_key: Option<String>,
    /// Value cell within a spec row
    #[serde(default)]
    pub spec_value: Option<String>,
    /// Items of the feature list
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub rating_value: Option<String>,
    #[serde(default)]
    pub rating_count: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
}

impl Source {
    /// Check if the source has a recorded fetch error
    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }
}
