use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::content::{Article, NewArticle, SourceType};
use crate::{Error, Result};

/// Repository for article CRUD operations
pub struct ArticleRepository<'a> {
    db: &'a Database,
}

/// Outcome of a feed-driven upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedUpsert {
    Inserted,
    Updated,
}

#[derive(FromRow)]
struct ArticleRow {
    id: String,
    title: String,
    slug: String,
    content: String,
    excerpt: Option<String>,
    cover_image: Option<String>,
    author: Option<String>,
    category: Option<String>,
    tags: String,
    meta_description: Option<String>,
    meta_keywords: String,
    seo_score: i64,
    is_ai_generated: i32,
    is_published: i32,
    view_count: i64,
    source_type: String,
    source_url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            cover_image: row.cover_image,
            author: row.author,
            category: row.category,
            tags: serde_json::from_str(&row.tags).unwrap_or_default(),
            meta_description: row.meta_description,
            meta_keywords: serde_json::from_str(&row.meta_keywords).unwrap_or_default(),
            seo_score: row.seo_score,
            is_ai_generated: row.is_ai_generated != 0,
            is_published: row.is_published != 0,
            view_count: row.view_count,
            source_type: SourceType::parse(&row.source_type),
            source_url: row.source_url,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ARTICLE_COLUMNS: &str = r#"
    id, title, slug, content, excerpt, cover_image, author, category, tags,
    meta_description, meta_keywords, seo_score, is_ai_generated, is_published,
    view_count, source_type, source_url, published_at, created_at, updated_at
"#;

fn is_slug_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .message()
            .contains("UNIQUE constraint failed: articles.slug"),
        _ => false,
    }
}

impl<'a> ArticleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new article; a slug collision fails with `DuplicateSlug`
    pub async fn create(&self, new_article: &NewArticle) -> Result<Article> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO articles
            (id, title, slug, content, excerpt, cover_image, author, category, tags,
             meta_description, meta_keywords, seo_score, is_ai_generated, is_published,
             source_type, source_url, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_article.title)
        .bind(&new_article.slug)
        .bind(&new_article.content)
        .bind(&new_article.excerpt)
        .bind(&new_article.cover_image)
        .bind(&new_article.author)
        .bind(&new_article.category)
        .bind(serde_json::to_string(&new_article.tags)?)
        .bind(&new_article.meta_description)
        .bind(serde_json::to_string(&new_article.meta_keywords)?)
        .bind(new_article.seo_score)
        .bind(new_article.is_ai_generated as i32)
        .bind(new_article.is_published as i32)
        .bind(new_article.source_type.as_str())
        .bind(&new_article.source_url)
        .bind(new_article.published_at)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(_) => self
                .find_by_id(id)
                .await?
                .ok_or_else(|| Error::ArticleNotFound(id.to_string())),
            Err(e) if is_slug_conflict(&e) => Err(Error::DuplicateSlug(new_article.slug.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Upsert a feed-ingested article, deduplicating by source_url.
    ///
    /// An existing row only gets content, excerpt, tags, updated_at and a
    /// previously empty cover image refreshed; published_at and view_count
    /// are never rewritten. A slug collision with a different source_url gets
    /// a uniquified slug.
    pub async fn upsert_from_feed(&self, new_article: &NewArticle) -> Result<FeedUpsert> {
        let source_url = new_article
            .source_url
            .as_deref()
            .ok_or_else(|| Error::FeedParse("feed item has no link to dedup on".to_string()))?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE articles
            SET content = ?,
                excerpt = ?,
                tags = ?,
                cover_image = CASE
                    WHEN cover_image IS NULL OR cover_image = '' THEN ?
                    ELSE cover_image
                END,
                updated_at = ?
            WHERE source_url = ?
            "#,
        )
        .bind(&new_article.content)
        .bind(&new_article.excerpt)
        .bind(serde_json::to_string(&new_article.tags)?)
        .bind(&new_article.cover_image)
        .bind(now)
        .bind(source_url)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(FeedUpsert::Updated);
        }

        match self.create(new_article).await {
            Ok(_) => Ok(FeedUpsert::Inserted),
            Err(Error::DuplicateSlug(slug)) => {
                // Different story, same headline: uniquify and retry once
                let mut retry = new_article.clone();
                retry.slug = format!("{}-{}", slug, &Uuid::new_v4().to_string()[..8]);
                self.create(&retry).await?;
                Ok(FeedUpsert::Inserted)
            }
            Err(e) => Err(e),
        }
    }

    /// Find an article by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles WHERE id = ?",
            ARTICLE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// Find an article by slug
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles WHERE slug = ?",
            ARTICLE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// Find an article by its ingestion source URL
    pub async fn find_by_source_url(&self, source_url: &str) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles WHERE source_url = ?",
            ARTICLE_COLUMNS
        ))
        .bind(source_url)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// List the most recently created articles
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles ORDER BY created_at DESC LIMIT ?",
            ARTICLE_COLUMNS
        ))
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Search articles by title or content
    pub async fn search(&self, query: &str) -> Result<Vec<Article>> {
        let pattern = format!("%{}%", query);

        let rows: Vec<ArticleRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM articles
            WHERE title LIKE ? OR content LIKE ?
            ORDER BY created_at DESC
            LIMIT 100
            "#,
            ARTICLE_COLUMNS
        ))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Record one view; view_count only ever increases
    pub async fn record_view(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE articles SET view_count = view_count + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Publish a draft; published_at is set only on the first publish
    pub async fn publish(&self, id: Uuid) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE articles
            SET is_published = 1,
                published_at = COALESCE(published_at, ?),
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

    /// Get total article count
    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss_draft(slug: &str, url: &str) -> NewArticle {
        NewArticle {
            title: "Feed item".into(),
            slug: slug.into(),
            content: "<p>original body</p>".into(),
            excerpt: Some("original body".into()),
            tags: vec!["tech".into()],
            is_published: true,
            source_type: SourceType::Rss,
            source_url: Some(url.into()),
            published_at: Some(Utc::now()),
            ..NewArticle::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let draft = NewArticle {
            title: "One".into(),
            slug: "same-slug".into(),
            content: "body".into(),
            ..NewArticle::default()
        };
        repo.create(&draft).await.unwrap();

        let err = repo.create(&draft).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateSlug(s) if s == "same-slug"));
    }

    #[tokio::test]
    async fn test_feed_upsert_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let draft = rss_draft("feed-item", "https://example.com/a/1");
        assert_eq!(repo.upsert_from_feed(&draft).await.unwrap(), FeedUpsert::Inserted);

        let stored = repo
            .find_by_source_url("https://example.com/a/1")
            .await
            .unwrap()
            .unwrap();
        let first_published_at = stored.published_at;
        repo.record_view(stored.id).await.unwrap();

        // Second pass over an unchanged feed: zero inserts, identity fields intact
        let mut second = draft.clone();
        second.content = "<p>refreshed body</p>".into();
        second.published_at = Some(Utc::now());
        assert_eq!(repo.upsert_from_feed(&second).await.unwrap(), FeedUpsert::Updated);

        assert_eq!(repo.count().await.unwrap(), 1);
        let after = repo
            .find_by_source_url("https://example.com/a/1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.content, "<p>refreshed body</p>");
        assert_eq!(after.published_at, first_published_at);
        assert_eq!(after.view_count, 1);
    }

    #[tokio::test]
    async fn test_feed_upsert_fills_empty_cover_image_only() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let mut draft = rss_draft("covered", "https://example.com/a/2");
        repo.upsert_from_feed(&draft).await.unwrap();

        draft.cover_image = Some("https://cdn.example.com/first.jpg".into());
        repo.upsert_from_feed(&draft).await.unwrap();

        draft.cover_image = Some("https://cdn.example.com/second.jpg".into());
        repo.upsert_from_feed(&draft).await.unwrap();

        let stored = repo
            .find_by_source_url("https://example.com/a/2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.cover_image.as_deref(),
            Some("https://cdn.example.com/first.jpg")
        );
    }

    #[tokio::test]
    async fn test_feed_upsert_uniquifies_colliding_slug() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let a = rss_draft("same-headline", "https://example.com/a/3");
        let b = rss_draft("same-headline", "https://example.com/a/4");

        assert_eq!(repo.upsert_from_feed(&a).await.unwrap(), FeedUpsert::Inserted);
        assert_eq!(repo.upsert_from_feed(&b).await.unwrap(), FeedUpsert::Inserted);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_publish_sets_published_at_once() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let article = repo
            .create(&NewArticle {
                title: "Draft".into(),
                slug: "draft".into(),
                content: "body".into(),
                ..NewArticle::default()
            })
            .await
            .unwrap();
        assert!(!article.is_published);
        assert!(article.published_at.is_none());

        repo.publish(article.id).await.unwrap();
        let first = repo.find_by_id(article.id).await.unwrap().unwrap();
        assert!(first.is_published);
        let ts = first.published_at.unwrap();

        repo.publish(article.id).await.unwrap();
        let second = repo.find_by_id(article.id).await.unwrap().unwrap();
        assert_eq!(second.published_at, Some(ts));
    }
}
