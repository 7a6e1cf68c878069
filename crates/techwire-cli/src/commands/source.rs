use anyhow::{bail, Context, Result};
use uuid::Uuid;

use techwire_core::{
    sources::{NewSource, ScrapePlan, SourceKind},
    storage::{Database, SourceRepository},
};

pub async fn add(
    db: &Database,
    name: &str,
    url: &str,
    kind: &str,
    category: Option<String>,
    frequency: u32,
    plan_path: Option<std::path::PathBuf>,
) -> Result<()> {
    let Some(kind) = SourceKind::parse(kind) else {
        bail!("Unknown source kind '{}' (expected rss or scrape)", kind);
    };

    let scrape_plan: Option<ScrapePlan> = match (kind, plan_path) {
        (SourceKind::Scrape, Some(path)) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read scrape plan {}", path.display()))?;
            Some(serde_json::from_str(&content).context("Invalid scrape plan JSON")?)
        }
        (SourceKind::Scrape, None) => bail!("Scrape sources need a --plan file"),
        (SourceKind::Rss, _) => None,
    };

    let source = SourceRepository::new(db)
        .create(&NewSource {
            name: name.to_string(),
            url: url.to_string(),
            kind,
            category,
            fetch_frequency_minutes: frequency,
            scrape_plan,
        })
        .await?;

    println!("Created source: {} ({})", source.name, source.id);
    Ok(())
}

pub async fn list(db: &Database) -> Result<()> {
    let sources = SourceRepository::new(db).list_all().await?;

    if sources.is_empty() {
        println!("No sources yet.");
        println!("\nTo register a source, run:");
        println!("  techwire source add -n <name> -u <url> -k rss");
        return Ok(());
    }

    println!("Sources ({}):\n", sources.len());

    for source in &sources {
        let state = if source.is_active { "" } else { " [disabled]" };
        let error = if let Some(err) = &source.last_error {
            format!(" [ERROR: {}]", err)
        } else {
            String::new()
        };

        println!(
            "  {} - {} ({}){}{}",
            source.id,
            source.name,
            source.kind.as_str(),
            state,
            error
        );
        println!("    URL: {}", source.url);
        if let Some(last) = source.last_fetched_at {
            println!("    Last fetched: {}", last.format("%Y-%m-%d %H:%M"));
        }
        println!();
    }

    Ok(())
}

pub async fn set_active(db: &Database, id: Uuid, is_active: bool) -> Result<()> {
    let repo = SourceRepository::new(db);
    if repo.find_by_id(id).await?.is_none() {
        bail!("No source with id {}", id);
    }

    repo.set_active(id, is_active).await?;
    println!(
        "Source {} is now {}",
        id,
        if is_active { "enabled" } else { "disabled" }
    );
    Ok(())
}
