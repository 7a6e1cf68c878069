use super::{parse_feed, FeedFetcher};
use crate::sources::SourceKind;
use crate::storage::{ArticleRepository, Database, FeedUpsert, SourceRepository};
use crate::Result;

/// Aggregate result of one RSS sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub inserted: u32,
    pub updated: u32,
    pub failed_sources: u32,
}

impl std::fmt::Display for SweepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} sources failed",
            self.inserted, self.updated, self.failed_sources
        )
    }
}

/// Fetch all active RSS sources and upsert their items as articles.
///
/// A failing source is recorded on the source row and never aborts the
/// sweep; only datastore errors propagate.
pub async fn sweep_rss_sources(db: &Database, fetcher: &FeedFetcher) -> Result<SweepOutcome> {
    let source_repo = SourceRepository::new(db);
    let article_repo = ArticleRepository::new(db);

    let sources = source_repo.list_active(SourceKind::Rss).await?;
    let mut outcome = SweepOutcome::default();

    for source in sources {
        tracing::info!("Fetching RSS source: {}", source.name);

        let drafts = match fetcher.fetch(&source.url).await {
            Ok(bytes) => match parse_feed(&bytes, &source) {
                Ok(drafts) => drafts,
                Err(e) => {
                    tracing::error!("Failed to parse feed '{}': {}", source.name, e);
                    source_repo.record_fetch_error(source.id, &e.to_string()).await?;
                    outcome.failed_sources += 1;
                    continue;
                }
            },
            Err(e) => {
                tracing::error!("Failed to fetch feed '{}': {}", source.name, e);
                source_repo.record_fetch_error(source.id, &e.to_string()).await?;
                outcome.failed_sources += 1;
                continue;
            }
        };

        let mut inserted = 0;
        let mut updated = 0;
        for draft in &drafts {
            match article_repo.upsert_from_feed(draft).await? {
                FeedUpsert::Inserted => inserted += 1,
                FeedUpsert::Updated => updated += 1,
            }
        }

        source_repo.record_fetch_success(source.id).await?;
        outcome.inserted += inserted;
        outcome.updated += updated;

        tracing::info!(
            "Feed '{}': {} new articles, {} refreshed",
            source.name,
            inserted,
            updated
        );
    }

    Ok(outcome)
}
