//! Manual article submission.

use crate::content::Article;
use crate::seo;
use crate::storage::{ArticleRepository, Database};
use crate::Result;

/// Validate a draft, fill defaulted fields, and store it.
///
/// Validation failures carry one message per offending field; a taken slug
/// surfaces as a duplicate-slug error for the caller to resolve.
pub async fn submit_article(
    db: &Database,
    mut draft: crate::content::NewArticle,
) -> Result<Article> {
    seo::validate(&draft)?;
    seo::apply_defaults(&mut draft);
    ArticleRepository::new(db).create(&draft).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{slugify, NewArticle};
    use crate::{Error, Result as CrateResult};

    fn draft(title: &str, content: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            slug: slugify(title),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_fills_defaults() {
        let db = Database::new_in_memory().await.unwrap();

        let body = "Lorem ipsum dolor sit amet. ".repeat(100);
        let article = submit_article(&db, draft("Manual Submission Works", &body))
            .await
            .unwrap();

        assert_eq!(article.slug, "manual-submission-works");
        assert_eq!(article.category.as_deref(), Some("news"));
        assert!(article.excerpt.is_some());
        let meta = article.meta_description.unwrap();
        assert!(meta.chars().count() <= 160);
        assert!(article.seo_score > 0);
    }

    #[tokio::test]
    async fn test_submit_collects_all_validation_problems() {
        let db = Database::new_in_memory().await.unwrap();

        let result: CrateResult<_> = submit_article(&db, NewArticle::default()).await;
        let Err(Error::Validation(problems)) = result else {
            panic!("expected validation error");
        };

        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.starts_with("title:")));
        assert!(problems.iter().any(|p| p.starts_with("content:")));
        assert!(problems.iter().any(|p| p.starts_with("slug:")));
    }

    #[tokio::test]
    async fn test_submit_rejects_duplicate_slug() {
        let db = Database::new_in_memory().await.unwrap();

        submit_article(&db, draft("Same Title", "body one"))
            .await
            .unwrap();
        let err = submit_article(&db, draft("Same Title", "body two"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateSlug(_)));
    }
}
