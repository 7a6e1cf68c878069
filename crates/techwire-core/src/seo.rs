//! Deterministic SEO scoring and article field validation.

use crate::content::NewArticle;
use crate::{Error, Result};

/// Compute an SEO score in [0, 100] from the article's on-page signals.
///
/// Point table:
/// - title length 40..=65 chars: 20, else >= 20 chars: 10
/// - meta description length 140..=160 chars: 20, else >= 100 chars: 10
/// - content length > 4000 chars: 25, else > 1500 chars: 15
/// - >= 3 tags: 15, else >= 1 tag: 10
/// - slug contains a title word: 10
/// - non-trivial cover image: 10
pub fn score(
    title: &str,
    meta_description: Option<&str>,
    content: &str,
    tags: &[String],
    slug: &str,
    cover_image: Option<&str>,
) -> i64 {
    let mut score: i64 = 0;

    let title_len = title.chars().count();
    if (40..=65).contains(&title_len) {
        score += 20;
    } else if title_len >= 20 {
        score += 10;
    }

    let meta_len = meta_description.map(|m| m.chars().count()).unwrap_or(0);
    if (140..=160).contains(&meta_len) {
        score += 20;
    } else if meta_len >= 100 {
        score += 10;
    }

    let content_len = content.chars().count();
    if content_len > 4000 {
        score += 25;
    } else if content_len > 1500 {
        score += 15;
    }

    if tags.len() >= 3 {
        score += 15;
    } else if !tags.is_empty() {
        score += 10;
    }

    if slug_contains_title_word(slug, title) {
        score += 10;
    }

    if is_real_cover_image(cover_image) {
        score += 10;
    }

    score.min(100)
}

fn slug_contains_title_word(slug: &str, title: &str) -> bool {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
        .any(|w| slug.to_lowercase().contains(&w.to_lowercase()))
}

fn is_real_cover_image(cover_image: Option<&str>) -> bool {
    match cover_image {
        Some(url) => {
            let url = url.trim();
            !url.is_empty() && !url.contains("placeholder")
        }
        None => false,
    }
}

/// Validate required fields of an article draft, collecting per-field messages
pub fn validate(article: &NewArticle) -> Result<()> {
    let mut problems = Vec::new();

    if article.title.trim().is_empty() {
        problems.push("title: must not be empty".to_string());
    }
    if article.content.trim().is_empty() {
        problems.push("content: must not be empty".to_string());
    }
    if article.slug.trim().is_empty() {
        problems.push("slug: must not be empty".to_string());
    } else if !article
        .slug
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        problems.push("slug: must contain only alphanumerics and dashes".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(problems))
    }
}

/// Fill defaulted fields on a validated draft and compute its SEO score
pub fn apply_defaults(article: &mut NewArticle) {
    if article.excerpt.as_deref().map_or(true, |e| e.trim().is_empty()) {
        article.excerpt = Some(crate::content::derive_excerpt(&article.content, 300));
    }
    if article.category.as_deref().map_or(true, |c| c.trim().is_empty()) {
        article.category = Some("news".to_string());
    }
    // The placeholder earns no cover-image points in the score
    if article
        .cover_image
        .as_deref()
        .map_or(true, |c| c.trim().is_empty())
    {
        article.cover_image = Some("/images/placeholder.jpg".to_string());
    }
    if article
        .meta_description
        .as_deref()
        .map_or(true, |m| m.trim().is_empty())
    {
        article.meta_description = article
            .excerpt
            .as_deref()
            .map(|e| crate::content::truncate_chars(e, 160));
    }

    article.seo_score = score(
        &article.title,
        article.meta_description.as_deref(),
        &article.content,
        &article.tags,
        &article.slug,
        article.cover_image.as_deref(),
    );
}
