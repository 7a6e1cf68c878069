use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use super::{PageLoader, ProductExtractor};
use crate::config::AppConfig;
use crate::sources::{ScrapePlan, Source, SourceKind};
use crate::storage::{Database, ProductRepository, ProductUpsert, SourceRepository};
use crate::{Error, Result};

/// Aggregate result of one scrape sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeOutcome {
    pub inserted: u32,
    pub updated: u32,
    pub failed_pages: u32,
    pub failed_sources: u32,
}

impl std::fmt::Display for ScrapeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} pages failed, {} sources failed",
            self.inserted, self.updated, self.failed_pages, self.failed_sources
        )
    }
}

/// Scrape all active scrape sources and upsert their products.
///
/// A failing page or source is counted and logged; only datastore errors
/// propagate.
pub async fn sweep_scrape_sources(
    db: &Database,
    loader: &dyn PageLoader,
    config: &AppConfig,
) -> Result<ScrapeOutcome> {
    let source_repo = SourceRepository::new(db);
    let product_repo = ProductRepository::new(db);

    let sources = source_repo.list_active(SourceKind::Scrape).await?;
    let mut outcome = ScrapeOutcome::default();

    for source in sources {
        tracing::info!("Scraping source: {}", source.name);

        let Some(plan) = source.scrape_plan.clone() else {
            let msg = "Source has no scrape plan";
            tracing::error!("Source '{}': {}", source.name, msg);
            source_repo.record_fetch_error(source.id, msg).await?;
            outcome.failed_sources += 1;
            continue;
        };

        let urls = match resolve_product_urls(&source, &plan, loader, config).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::error!("Source '{}': {}", source.name, e);
                source_repo.record_fetch_error(source.id, &e.to_string()).await?;
                outcome.failed_sources += 1;
                continue;
            }
        };

        let mut inserted = 0;
        let mut updated = 0;
        for url in &urls {
            match scrape_product_page(url, &plan, loader, &product_repo).await {
                Ok(ProductUpsert::Inserted) => inserted += 1,
                Ok(ProductUpsert::Updated) => updated += 1,
                Err(Error::Database(e)) => return Err(Error::Database(e)),
                Err(e) => {
                    tracing::warn!("Failed to scrape {}: {}", url, e);
                    outcome.failed_pages += 1;
                }
            }
        }

        source_repo.record_fetch_success(source.id).await?;
        outcome.inserted += inserted;
        outcome.updated += updated;

        tracing::info!(
            "Source '{}': {} new products, {} refreshed",
            source.name,
            inserted,
            updated
        );
    }

    Ok(outcome)
}

async fn scrape_product_page(
    url: &Url,
    plan: &ScrapePlan,
    loader: &dyn PageLoader,
    repo: &ProductRepository<'_>,
) -> Result<ProductUpsert> {
    let html = loader.load(url.as_str()).await?;

    if let Some(ready) = plan.ready_selector.as_deref() {
        if let Ok(selector) = Selector::parse(ready) {
            let document = Html::parse_document(&html);
            if document.select(&selector).next().is_none() {
                tracing::warn!("Ready selector '{}' not found on {}", ready, url);
            }
        }
    }

    let extractor = ProductExtractor::new(&plan.selectors);
    let product = extractor.extract(&html, url, plan.categories.clone());
    repo.upsert(&product).await
}

/// Resolve the set of product pages to visit for one source.
///
/// Explicit URLs from the plan win; otherwise links are harvested from the
/// listing page. Order is preserved, duplicates dropped, and the total capped
/// by configuration.
async fn resolve_product_urls(
    source: &Source,
    plan: &ScrapePlan,
    loader: &dyn PageLoader,
    config: &AppConfig,
) -> Result<Vec<Url>> {
    let base = Url::parse(&source.url)
        .map_err(|e| Error::Config(format!("Invalid source URL '{}': {}", source.url, e)))?;

    let raw_urls: Vec<String> = if !plan.product_urls.is_empty() {
        plan.product_urls.clone()
    } else if let (Some(list_url), Some(link_selector)) =
        (plan.product_list_url.as_deref(), plan.product_link.as_deref())
    {
        let list_url = base
            .join(list_url)
            .map_err(|e| Error::Config(format!("Invalid listing URL '{}': {}", list_url, e)))?;
        harvest_product_links(&list_url, link_selector, loader).await?
    } else {
        return Err(Error::Config(
            "Scrape plan needs either product_urls or product_list_url with product_link".into(),
        ));
    };

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for raw in raw_urls {
        let Ok(url) = base.join(&raw) else {
            tracing::warn!("Skipping unparseable product URL: {}", raw);
            continue;
        };
        if seen.insert(url.clone()) {
            urls.push(url);
        }
        if urls.len() >= config.scrape.max_products_per_source {
            tracing::warn!(
                "Source '{}' capped at {} product pages",
                source.name,
                config.scrape.max_products_per_source
            );
            break;
        }
    }

    Ok(urls)
}

async fn harvest_product_links(
    list_url: &Url,
    link_selector: &str,
    loader: &dyn PageLoader,
) -> Result<Vec<String>> {
    let selector = Selector::parse(link_selector)
        .map_err(|e| Error::Config(format!("Invalid product_link selector '{}': {}", link_selector, e)))?;

    let html = loader.load(list_url.as_str()).await?;
    let document = Html::parse_document(&html);

    let links: Vec<String> = document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .filter_map(|href| list_url.join(&href).ok())
        .map(|u| u.to_string())
        .collect();

    tracing::debug!("Harvested {} product links from {}", links.len(), list_url);
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FieldSelectors, NewSource};
    use crate::storage::Database;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Loader serving canned pages from a map; anything else is a 404
    struct FixtureLoader {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageLoader for FixtureLoader {
        async fn load(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Scrape(format!("HTTP 404 Not Found for {}", url)))
        }
    }

    fn product_page(name: &str, price: &str) -> String {
        format!(
            r#"<html><body>
                 <h1 class="title">{name}</h1>
                 <span class="price">{price}</span>
               </body></html>"#
        )
    }

    fn test_plan() -> ScrapePlan {
        ScrapePlan {
            product_urls: Vec::new(),
            product_list_url: Some("/gpus".into()),
            product_link: Some("a.card".into()),
            ready_selector: None,
            selectors: FieldSelectors {
                name: Some("h1.title".into()),
                price: Some("span.price".into()),
                ..Default::default()
            },
            categories: vec!["gpu".into()],
        }
    }

    async fn seed_source(db: &Database, plan: ScrapePlan) {
        SourceRepository::new(db)
            .create(&NewSource {
                name: "Example Shop".into(),
                url: "https://shop.example.com".into(),
                kind: SourceKind::Scrape,
                category: None,
                fetch_frequency_minutes: 1440,
                scrape_plan: Some(plan),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_harvests_listing_and_upserts() {
        let db = Database::new_in_memory().await.unwrap();
        seed_source(&db, test_plan()).await;

        let mut pages = HashMap::new();
        pages.insert(
            "https://shop.example.com/gpus".to_string(),
            r#"<html><body>
                 <a class="card" href="/p/alpha">Alpha</a>
                 <a class="card" href="/p/beta">Beta</a>
                 <a class="card" href="/p/alpha">Alpha again</a>
               </body></html>"#
                .to_string(),
        );
        pages.insert(
            "https://shop.example.com/p/alpha".to_string(),
            product_page("Alpha GPU", "$499.99"),
        );
        pages.insert(
            "https://shop.example.com/p/beta".to_string(),
            product_page("Beta GPU", "$899.00"),
        );
        let loader = FixtureLoader { pages };

        let config = AppConfig::default();
        let outcome = sweep_scrape_sources(&db, &loader, &config).await.unwrap();

        // Duplicate listing link visits the page once
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.failed_pages, 0);
        assert_eq!(outcome.failed_sources, 0);

        let repo = ProductRepository::new(&db);
        let alpha = repo
            .find_by_source_url("https://shop.example.com/p/alpha")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alpha.name.as_deref(), Some("Alpha GPU"));
        assert_eq!(alpha.price, Some(499.99));
        assert_eq!(alpha.categories, vec!["gpu"]);
    }

    #[tokio::test]
    async fn test_second_sweep_updates_in_place() {
        let db = Database::new_in_memory().await.unwrap();
        let mut plan = test_plan();
        plan.product_list_url = None;
        plan.product_link = None;
        plan.product_urls = vec!["/p/alpha".into()];
        seed_source(&db, plan).await;

        let config = AppConfig::default();
        let page_key = "https://shop.example.com/p/alpha".to_string();

        let mut pages = HashMap::new();
        pages.insert(page_key.clone(), product_page("Alpha GPU", "$499.99"));
        let first = sweep_scrape_sources(&db, &FixtureLoader { pages }, &config)
            .await
            .unwrap();
        assert_eq!(first.inserted, 1);

        let mut pages = HashMap::new();
        pages.insert(page_key.clone(), product_page("Alpha GPU", "$449.99"));
        let second = sweep_scrape_sources(&db, &FixtureLoader { pages }, &config)
            .await
            .unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 1);

        let product = ProductRepository::new(&db)
            .find_by_source_url(&page_key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.price, Some(449.99));
    }

    #[tokio::test]
    async fn test_failed_page_is_isolated() {
        let db = Database::new_in_memory().await.unwrap();
        let mut plan = test_plan();
        plan.product_list_url = None;
        plan.product_link = None;
        plan.product_urls = vec!["/p/good".into(), "/p/missing".into()];
        seed_source(&db, plan).await;

        let mut pages = HashMap::new();
        pages.insert(
            "https://shop.example.com/p/good".to_string(),
            product_page("Good GPU", "$299.00"),
        );
        let loader = FixtureLoader { pages };

        let config = AppConfig::default();
        let outcome = sweep_scrape_sources(&db, &loader, &config).await.unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.failed_pages, 1);
        assert_eq!(outcome.failed_sources, 0);
    }

    #[tokio::test]
    async fn test_plan_without_urls_fails_source() {
        let db = Database::new_in_memory().await.unwrap();
        let mut plan = test_plan();
        plan.product_list_url = None;
        plan.product_link = None;
        seed_source(&db, plan).await;

        let loader = FixtureLoader { pages: HashMap::new() };
        let config = AppConfig::default();
        let outcome = sweep_scrape_sources(&db, &loader, &config).await.unwrap();

        assert_eq!(outcome.failed_sources, 1);
        assert_eq!(outcome.inserted, 0);

        let sources = SourceRepository::new(&db).list_all().await.unwrap();
        assert!(sources[0].last_error.is_some());
    }
}
