use feed_rs::parser;
use scraper::{Html, Selector};

use crate::content::{derive_excerpt, slugify, NewArticle, SourceType};
use crate::seo;
use crate::sources::Source;
use crate::{Error, Result};

/// Extract the first usable `<img src>` URL from HTML content.
///
/// Matching goes through the HTML parser: mixed-case markup and multi-byte
/// text never shift offsets, and small images (likely icons/tracking pixels)
/// are skipped.
fn extract_first_image_url(html: &str) -> Option<String> {
    let selector = Selector::parse("img[src]").ok()?;
    let fragment = Html::parse_fragment(html);

    fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|url| {
            !url.is_empty()
                && !url.contains("1x1")
                && !url.contains("pixel")
                && !url.contains("tracking")
        })
        .map(|url| url.to_string())
}

/// Parse RSS/Atom feed content into article drafts for one source.
///
/// Items without a link are skipped; the link is the dedup key.
pub fn parse_feed(content: &[u8], source: &Source) -> Result<Vec<NewArticle>> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let articles = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = match entry.links.first() {
                Some(l) => l.href.clone(),
                None => {
                    tracing::debug!("Skipping feed item without link in '{}'", source.name);
                    return None;
                }
            };

            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            let author = entry.authors.first().map(|a| a.name.clone());

            let content = entry
                .content
                .and_then(|c| c.body)
                .or_else(|| entry.summary.map(|s| s.content))
                .unwrap_or_default();

            let excerpt = derive_excerpt(&content, 300);

            let tags: Vec<String> = entry
                .categories
                .iter()
                .map(|c| c.label.clone().unwrap_or_else(|| c.term.clone()))
                .filter(|t| !t.is_empty())
                .collect();

            let published_at = entry.published.or(entry.updated);

            // Image priority: media thumbnail/enclosure, then media content,
            // then the first <img> in the item HTML
            let cover_image = entry
                .media
                .first()
                .and_then(|m| m.thumbnails.first())
                .map(|t| t.image.uri.clone())
                .or_else(|| {
                    entry
                        .media
                        .first()
                        .and_then(|m| m.content.first())
                        .and_then(|c| c.url.as_ref())
                        .map(|u| u.to_string())
                })
                .or_else(|| extract_first_image_url(&content));

            let slug = slugify(&title);
            let seo_score = seo::score(
                &title,
                Some(&excerpt),
                &content,
                &tags,
                &slug,
                cover_image.as_deref(),
            );

            Some(NewArticle {
                title,
                slug,
                content,
                excerpt: Some(excerpt),
                cover_image,
                author,
                category: source.category.clone(),
                tags,
                meta_description: None,
                meta_keywords: Vec::new(),
                seo_score,
                is_ai_generated: false,
                is_published: true,
                source_type: SourceType::Rss,
                source_url: Some(link),
                published_at,
            })
        })
        .collect();

    Ok(articles)
}
