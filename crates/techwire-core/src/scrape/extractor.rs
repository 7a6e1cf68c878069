use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::content::{Availability, Currency, NewProduct};
use crate::sources::FieldSelectors;

/// Selector-driven product field extraction.
///
/// Every field read is best-effort: an absent, invalid or non-matching
/// selector omits the field and never fails the page.
pub struct ProductExtractor<'a> {
    selectors: &'a FieldSelectors,
}

impl<'a> ProductExtractor<'a> {
    pub fn new(selectors: &'a FieldSelectors) -> Self {
        Self { selectors }
    }

    /// Extract a product from a rendered page
    pub fn extract(&self, html: &str, page_url: &Url, categories: Vec<String>) -> NewProduct {
        let document = Html::parse_document(html);

        let mut product = NewProduct::empty(page_url.to_string(), categories);

        product.name = self.select_text(&document, self.selectors.name.as_deref());
        product.brand = self.select_text(&document, self.selectors.brand.as_deref());
        product.description = self.select_text(&document, self.selectors.description.as_deref());

        if let Some(price_text) = self.select_text(&document, self.selectors.price.as_deref()) {
            product.currency = infer_currency(&price_text);
            product.price = parse_price(&price_text);
        }

        product.image_url = self
            .select_attr(&document, self.selectors.image.as_deref())
            .and_then(|src| page_url.join(&src).ok())
            .map(|u| u.to_string());

        product.specs = self.extract_specs(&document);
        product.features = self.extract_features(&document);

        product.rating_value = self
            .select_text(&document, self.selectors.rating_value.as_deref())
            .and_then(|t| parse_decimal(&t));
        product.rating_count = self
            .select_text(&document, self.selectors.rating_count.as_deref())
            .and_then(|t| parse_integer(&t));

        if let Some(text) = self.select_text(&document, self.selectors.availability.as_deref()) {
            product.availability = classify_availability(&text);
        }

        product
    }

    /// Text of the first element matching the selector, trimmed
    fn select_text(&self, document: &Html, selector: Option<&str>) -> Option<String> {
        let selector = parse_selector(selector?)?;
        document
            .select(&selector)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    }

    /// Image-bearing attribute of the first element matching the selector
    fn select_attr(&self, document: &Html, selector: Option<&str>) -> Option<String> {
        let selector = parse_selector(selector?)?;
        let element = document.select(&selector).next()?;

        for attr in ["src", "data-src", "content", "href"] {
            if let Some(value) = element.value().attr(attr) {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        None
    }

    fn extract_specs(&self, document: &Html) -> BTreeMap<String, String> {
        let mut specs = BTreeMap::new();

        let (Some(row_sel), Some(key_sel), Some(value_sel)) = (
            self.selectors.spec_row.as_deref().and_then(parse_selector),
            self.selectors.spec_key.as_deref().and_then(parse_selector),
            self.selectors.spec_value.as_deref().and_then(parse_selector),
        ) else {
            return specs;
        };

        for row in document.select(&row_sel) {
            let key = row.select(&key_sel).next().map(element_text);
            let value = row.select(&value_sel).next().map(element_text);
            if let (Some(key), Some(value)) = (key, value) {
                if !key.is_empty() && !value.is_empty() {
                    specs.insert(key, value);
                }
            }
        }

        specs
    }

    fn extract_features(&self, document: &Html) -> Vec<String> {
        let Some(selector) = self.selectors.feature.as_deref().and_then(parse_selector) else {
            return Vec::new();
        };

        document
            .select(&selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

fn parse_selector(raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Invalid CSS selector '{}': {}", raw, e);
            None
        }
    }
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Infer the currency from symbols in the scraped price text
pub fn infer_currency(price_text: &str) -> Currency {
    if price_text.contains('€') {
        Currency::Eur
    } else if price_text.contains('£') {
        Currency::Gbp
    } else if price_text.contains('¥') {
        Currency::Jpy
    } else {
        Currency::Usd
    }
}

/// Normalize a price string by stripping everything but digits and the
/// decimal point
pub fn parse_price(price_text: &str) -> Option<f64> {
    let cleaned: String = price_text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    cleaned.parse().ok()
}

fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

fn parse_integer(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    cleaned.parse().ok()
}

/// Classify availability text by substring match.
///
/// Negative phrases are checked first: "unavailable" contains "available".
pub fn classify_availability(text: &str) -> Availability {
    let text = text.to_lowercase();

    if text.contains("out of stock") || text.contains("unavailable") || text.contains("sold out") {
        Availability::OutOfStock
    } else if text.contains("in stock") || text.contains("available") {
        Availability::InStock
    } else {
        Availability::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_selectors() -> FieldSelectors {
        FieldSelectors {
            name: Some("h1.product-title".into()),
            brand: Some(".brand".into()),
            price: Some(".price-now".into()),
            description: Some(".product-description".into()),
            image: Some("img.product-photo".into()),
            spec_row: Some("table.specs tr".into()),
            spec_key: Some("th".into()),
            spec_value: Some("td".into()),
            feature: Some("ul.features li".into()),
            rating_value: Some(".rating .value".into()),
            rating_count: Some(".rating .count".into()),
            availability: Some(".stock-status".into()),
        }
    }

    const PRODUCT_PAGE: &str = r#"
    <html><body>
      <h1 class="product-title">GeForce RTX 5090</h1>
      <span class="brand">NVIDIA</span>
      <div class="price-now">$1,999.99</div>
      <p class="product-description">The flagship GPU.</p>
      <img class="product-photo" src="/images/rtx5090.jpg">
      <table class="specs">
        <tr><th>Memory</th><td>32 GB GDDR7</td></tr>
        <tr><th>TDP</th><td>575 W</td></tr>
      </table>
      <ul class="features">
        <li>DLSS 4</li>
        <li>PCIe 5.0</li>
      </ul>
      <div class="rating"><span class="value">4.8 out of 5</span><span class="count">(1,234 ratings)</span></div>
      <div class="stock-status">In Stock</div>
    </body></html>
    "#;

    #[test]
    fn test_extract_full_page() {
        let selectors = full_selectors();
        let extractor = ProductExtractor::new(&selectors);
        let url = Url::parse("https://shop.example.com/p/rtx-5090").unwrap();

        let product = extractor.extract(PRODUCT_PAGE, &url, vec!["gpu".into()]);

        assert_eq!(product.name.as_deref(), Some("GeForce RTX 5090"));
        assert_eq!(product.brand.as_deref(), Some("NVIDIA"));
        assert_eq!(product.price, Some(1999.99));
        assert_eq!(product.currency, Currency::Usd);
        assert_eq!(product.description.as_deref(), Some("The flagship GPU."));
        // Relative image URLs resolve against the page URL
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://shop.example.com/images/rtx5090.jpg")
        );
        assert_eq!(product.specs.get("Memory").map(String::as_str), Some("32 GB GDDR7"));
        assert_eq!(product.specs.get("TDP").map(String::as_str), Some("575 W"));
        assert_eq!(product.features, vec!["DLSS 4", "PCIe 5.0"]);
        assert_eq!(product.rating_value, Some(4.8));
        assert_eq!(product.rating_count, Some(1234));
        assert_eq!(product.availability, Availability::InStock);
        assert_eq!(product.source_url, "https://shop.example.com/p/rtx-5090");
        assert_eq!(product.categories, vec!["gpu"]);
    }

    #[test]
    fn test_missing_selectors_yield_identity_only() {
        let selectors = FieldSelectors::default();
        let extractor = ProductExtractor::new(&selectors);
        let url = Url::parse("https://shop.example.com/p/bare").unwrap();

        let product = extractor.extract(PRODUCT_PAGE, &url, vec!["misc".into()]);

        assert!(product.name.is_none());
        assert!(product.price.is_none());
        assert!(product.image_url.is_none());
        assert!(product.specs.is_empty());
        assert!(product.features.is_empty());
        assert_eq!(product.availability, Availability::Unknown);
        assert_eq!(product.source_url, "https://shop.example.com/p/bare");
        assert_eq!(product.categories, vec!["misc"]);
    }

    #[test]
    fn test_non_matching_selectors_never_fail() {
        let mut selectors = full_selectors();
        selectors.name = Some("h1.does-not-exist".into());
        selectors.price = Some("totally [[ invalid".into());
        let extractor = ProductExtractor::new(&selectors);
        let url = Url::parse("https://shop.example.com/p/x").unwrap();

        let product = extractor.extract(PRODUCT_PAGE, &url, Vec::new());
        assert!(product.name.is_none());
        assert!(product.price.is_none());
    }

    #[test]
    fn test_infer_currency() {
        assert_eq!(infer_currency("$1,999.99"), Currency::Usd);
        assert_eq!(infer_currency("€899,00"), Currency::Eur);
        assert_eq!(infer_currency("£749.99"), Currency::Gbp);
        assert_eq!(infer_currency("¥120,000"), Currency::Jpy);
        assert_eq!(infer_currency("1299"), Currency::Usd);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$1,999.99"), Some(1999.99));
        assert_eq!(parse_price("¥120,000"), Some(120000.0));
        assert_eq!(parse_price("Now only 49.95!"), Some(49.95));
        assert_eq!(parse_price("Call for price"), None);
    }

    #[test]
    fn test_classify_availability() {
        assert_eq!(classify_availability("In Stock"), Availability::InStock);
        assert_eq!(classify_availability("Available now"), Availability::InStock);
        assert_eq!(classify_availability("Out of Stock"), Availability::OutOfStock);
        assert_eq!(classify_availability("Sold out!"), Availability::OutOfStock);
        // "unavailable" must not match the "available" branch
        assert_eq!(
            classify_availability("Currently unavailable"),
            Availability::OutOfStock
        );
        assert_eq!(classify_availability("Ships soon"), Availability::Unknown);
    }
}
