use anyhow::{bail, Context, Result};

use techwire_core::{
    articles::submit_article,
    content::{slugify, NewArticle, SourceType},
    storage::{ArticleRepository, Database},
};

pub async fn new(
    db: &Database,
    title: &str,
    file: &std::path::Path,
    category: Option<String>,
    tags: Vec<String>,
    cover: Option<String>,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let draft = NewArticle {
        title: title.to_string(),
        slug: slugify(title),
        content,
        category,
        tags,
        cover_image: cover,
        source_type: SourceType::Manual,
        ..Default::default()
    };

    let article = submit_article(db, draft).await?;

    println!("Created article: {} ({})", article.title, article.slug);
    println!("  SEO score: {}/100", article.seo_score);
    println!("  Publish with: techwire article publish {}", article.slug);
    Ok(())
}

pub async fn list(db: &Database, limit: i64) -> Result<()> {
    let articles = ArticleRepository::new(db)
        .list_recent(limit.max(0) as u32)
        .await?;

    if articles.is_empty() {
        println!("No articles yet.");
        return Ok(());
    }

    println!("Articles ({}):\n", articles.len());

    for article in &articles {
        let state = if article.is_published {
            "published"
        } else {
            "draft"
        };
        let origin = if article.is_ai_generated {
            " [AI]"
        } else {
            ""
        };

        println!("  {} ({}){}", article.title, state, origin);
        println!(
            "    slug: {}  seo: {}/100  views: {}",
            article.slug, article.seo_score, article.view_count
        );
        println!();
    }

    Ok(())
}

pub async fn search(db: &Database, query: &str) -> Result<()> {
    let articles = ArticleRepository::new(db).search(query).await?;

    if articles.is_empty() {
        println!("No articles matching '{}'.", query);
        return Ok(());
    }

    println!("Matches for '{}' ({}):\n", query, articles.len());
    for article in &articles {
        println!("  {} (slug: {})", article.title, article.slug);
    }

    Ok(())
}

pub async fn show(db: &Database, slug: &str) -> Result<()> {
    let repo = ArticleRepository::new(db);
    let Some(article) = repo.find_by_slug(slug).await? else {
        bail!("No article with slug '{}'", slug);
    };

    repo.record_view(article.id).await?;

    println!("# {}", article.title);
    println!();
    println!(
        "slug: {}  source: {}  seo: {}/100",
        article.slug,
        article.source_type.as_str(),
        article.seo_score
    );
    if let Some(category) = &article.category {
        println!("category: {}", category);
    }
    if !article.tags.is_empty() {
        println!("tags: {}", article.tags.join(", "));
    }
    if let Some(published_at) = article.published_at {
        println!("published: {}", published_at.format("%Y-%m-%d %H:%M"));
    }
    println!();
    println!("{}", article.content);

    Ok(())
}

pub async fn publish(db: &Database, slug: &str) -> Result<()> {
    let repo = ArticleRepository::new(db);
    let Some(article) = repo.find_by_slug(slug).await? else {
        bail!("No article with slug '{}'", slug);
    };

    if article.is_published {
        println!("Article '{}' is already published.", slug);
        return Ok(());
    }

    repo.publish(article.id).await?;
    println!("Published: {}", article.title);
    Ok(())
}
