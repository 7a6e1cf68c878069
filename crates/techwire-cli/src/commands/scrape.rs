use anyhow::Result;

use techwire_core::{
    scrape::{sweep_scrape_sources, HttpPageLoader},
    storage::Database,
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    println!("Scraping all active scrape sources...");

    let loader = HttpPageLoader::new(config)?;
    let outcome = sweep_scrape_sources(db, &loader, config).await?;

    println!("Done: {}", outcome);
    Ok(())
}
