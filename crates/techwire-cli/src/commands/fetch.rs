use anyhow::Result;

use techwire_core::{rss::FeedFetcher, storage::Database, AppConfig};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    println!("Fetching all active RSS sources...");

    let fetcher = FeedFetcher::new(config)?;
    let outcome = techwire_core::rss::sweep_rss_sources(db, &fetcher).await?;

    println!("Done: {}", outcome);
    Ok(())
}
