use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::sources::{NewSource, Source, SourceKind};
use crate::{Error, Result};

/// Repository for source CRUD operations
pub struct SourceRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct SourceRow {
    id: String,
    name: String,
    url: String,
    kind: String,
    category: Option<String>,
    is_active: i32,
    fetch_frequency_minutes: i64,
    last_fetched_at: Option<DateTime<Utc>>,
    scrape_plan: Option<String>,
    last_error: Option<String>,
    last_error_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            name: row.name,
            url: row.url,
            kind: SourceKind::parse(&row.kind).unwrap_or(SourceKind::Rss),
            category: row.category,
            is_active: row.is_active != 0,
            fetch_frequency_minutes: row.fetch_frequency_minutes as u32,
            last_fetched_at: row.last_fetched_at,
            scrape_plan: row
                .scrape_plan
                .as_deref()
                .and_then(|json| serde_json::from_str(json).ok()),
            last_error: row.last_error,
            last_error_at: row.last_error_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SOURCE_COLUMNS: &str = r#"
    id, name, url, kind, category, is_active, fetch_frequency_minutes,
    last_fetched_at, scrape_plan, last_error, last_error_at, created_at, updated_at
"#;

impl<'a> SourceRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a new source
    pub async fn create(&self, new_source: &NewSource) -> Result<Source> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let scrape_plan = new_source
            .scrape_plan
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO sources
            (id, name, url, kind, category, fetch_frequency_minutes, scrape_plan,
             created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_source.name)
        .bind(&new_source.url)
        .bind(new_source.kind.as_str())
        .bind(&new_source.category)
        .bind(new_source.fetch_frequency_minutes as i64)
        .bind(scrape_plan)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::SourceNotFound(id.to_string()))
    }

    /// Find a source by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Source>> {
        let row: Option<SourceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sources WHERE id = ?",
            SOURCE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Source::from))
    }

    /// Get all sources
    pub async fn list_all(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sources ORDER BY name ASC",
            SOURCE_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Get active sources of one kind; inactive sources never reach the pipeline
    pub async fn list_active(&self, kind: SourceKind) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sources WHERE kind = ? AND is_active = 1 ORDER BY name ASC",
            SOURCE_COLUMNS
        ))
        .bind(kind.as_str())
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Record a successful fetch, clearing any previous error
    pub async fn record_fetch_success(&self, id: Uuid) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sources
            SET last_fetched_at = ?,
                last_error = NULL,
                last_error_at = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Record a fetch failure on the source
    pub async fn record_fetch_error(&self, id: Uuid, error: &str) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sources
            SET last_error = ?,
                last_error_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(error)
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Enable or disable a source
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        let now = Utc::now();

        sqlx::query("UPDATE sources SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active as i32)
            .bind(now)
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ScrapePlan;

    fn new_source(name: &str, url: &str, kind: SourceKind) -> NewSource {
        NewSource {
            name: name.into(),
            url: url.into(),
            kind,
            category: Some("hardware".into()),
            fetch_frequency_minutes: 60,
            scrape_plan: None,
        }
    }

    #[tokio::test]
    async fn test_inactive_sources_excluded_from_sweeps() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        let active = repo
            .create(&new_source("a", "https://a.example.com/feed", SourceKind::Rss))
            .await
            .unwrap();
        let inactive = repo
            .create(&new_source("b", "https://b.example.com/feed", SourceKind::Rss))
            .await
            .unwrap();
        repo.set_active(inactive.id, false).await.unwrap();

        let listed = repo.list_active(SourceKind::Rss).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, active.id);

        // Kind filter keeps scrape sources out of RSS sweeps
        repo.create(&new_source("c", "https://c.example.com", SourceKind::Scrape))
            .await
            .unwrap();
        assert_eq!(repo.list_active(SourceKind::Rss).await.unwrap().len(), 1);
        assert_eq!(repo.list_active(SourceKind::Scrape).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_recording_and_clearing() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        let source = repo
            .create(&new_source("a", "https://a.example.com/feed", SourceKind::Rss))
            .await
            .unwrap();

        repo.record_fetch_error(source.id, "HTTP 503").await.unwrap();
        let errored = repo.find_by_id(source.id).await.unwrap().unwrap();
        assert_eq!(errored.last_error.as_deref(), Some("HTTP 503"));
        assert!(errored.last_error_at.is_some());
        assert!(errored.last_fetched_at.is_none());

        repo.record_fetch_success(source.id).await.unwrap();
        let cleared = repo.find_by_id(source.id).await.unwrap().unwrap();
        assert!(cleared.last_error.is_none());
        assert!(cleared.last_fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_scrape_plan_roundtrip() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        let plan: ScrapePlan = serde_json::from_str(
            r#"{"product_urls": ["/p/1"], "selectors": {"name": "h1"}}"#,
        )
        .unwrap();

        let mut source = new_source("shop", "https://shop.example.com", SourceKind::Scrape);
        source.scrape_plan = Some(plan);
        let created = repo.create(&source).await.unwrap();

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        let plan = stored.scrape_plan.unwrap();
        assert_eq!(plan.product_urls, vec!["/p/1"]);
        assert_eq!(plan.selectors.name.as_deref(), Some("h1"));
    }
}
