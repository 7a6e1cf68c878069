use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an article came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Manual,
    Rss,
    Scraped,
    Ai,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Manual => "manual",
            SourceType::Rss => "rss",
            SourceType::Scraped => "scraped",
            SourceType::Ai => "ai",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "rss" => SourceType::Rss,
            "scraped" => SourceType::Scraped,
            "ai" => SourceType::Ai,
            _ => SourceType::Manual,
        }
    }
}

/// A published or draft article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Vec<String>,
    pub seo_score: i64,
    pub is_ai_generated: bool,
    pub is_published: bool,
    pub view_count: i64,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Vec<String>,
    pub seo_score: i64,
    pub is_ai_generated: bool,
    pub is_published: bool,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Default for NewArticle {
    fn default() -> Self {
        Self {
            title: String::new(),
            slug: String::new(),
            content: String::new(),
            excerpt: None,
            cover_image: None,
            author: None,
            category: None,
            tags: Vec::new(),
            meta_description: None,
            meta_keywords: Vec::new(),
            seo_score: 0,
            is_ai_generated: false,
            is_published: false,
            source_type: SourceType::Manual,
            source_url: None,
            published_at: None,
        }
    }
}

/// Currency of a scraped price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "EUR" => Currency::Eur,
            "GBP" => Currency::Gbp,
            "JPY" => Currency::Jpy,
            _ => Currency::Usd,
        }
    }
}

/// Stock status of a scraped product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
    Unknown,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::OutOfStock => "out_of_stock",
            Availability::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "in_stock" => Availability::InStock,
            "out_of_stock" => Availability::OutOfStock,
            _ => Availability::Unknown,
        }
    }
}

/// A product record extracted from a scrape target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub currency: Currency,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub specs: BTreeMap<String, String>,
    pub features: Vec<String>,
    pub rating_value: Option<f64>,
    pub rating_count: Option<i64>,
    pub availability: Availability,
    /// Absolute product page URL, the dedup key
    pub source_url: String,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data extracted for a single product page
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub currency: Currency,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub specs: BTreeMap<String, String>,
    pub features: Vec<String>,
    pub rating_value: Option<f64>,
    pub rating_count: Option<i64>,
    pub availability: Availability,
    pub source_url: String,
    pub categories: Vec<String>,
}

impl NewProduct {
    /// An empty extraction result for a page where no selector matched
    pub fn empty(source_url: String, categories: Vec<String>) -> Self {
        Self {
            name: None,
            brand: None,
            price: None,
            currency: Currency::Usd,
            description: None,
            image_url: None,
            specs: BTreeMap::new(),
            features: Vec::new(),
            rating_value: None,
            rating_count: None,
            availability: Availability::Unknown,
            source_url,
            categories,
        }
    }
}

/// Build a URL-safe slug from a title
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// Strip markup from HTML and truncate to at most `max_chars` characters
pub fn derive_excerpt(html: &str, max_chars: usize) -> String {
    let text = html2text::from_read(html.as_bytes(), 200).unwrap_or_else(|_| html.to_string());
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    truncate_chars(&text, max_chars)
}

/// Truncate a string to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("The RTX 5090: First Look!"), "the-rtx-5090-first-look");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("Caffè Überreview"), "caffè-überreview");
    }

    #[test]
    fn test_derive_excerpt_strips_markup() {
        let html = "<p>Hello <b>world</b>, this is <a href='#'>a link</a>.</p>";
        let excerpt = derive_excerpt(html, 300);
        assert!(excerpt.contains("Hello world"));
        assert!(!excerpt.contains('<'));
    }

    #[test]
    fn test_derive_excerpt_truncates() {
        let html = "word ".repeat(200);
        let excerpt = derive_excerpt(&html, 300);
        assert!(excerpt.chars().count() <= 300);
    }

    #[test]
    fn test_truncate_chars_boundary() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        // Multi-byte chars must not be split
        assert_eq!(truncate_chars("ééééé", 2), "éé");
    }

    #[test]
    fn test_source_type_roundtrip() {
        for st in [SourceType::Manual, SourceType::Rss, SourceType::Scraped, SourceType::Ai] {
            assert_eq!(SourceType::parse(st.as_str()), st);
        }
        assert_eq!(SourceType::parse("bogus"), SourceType::Manual);
    }
}
