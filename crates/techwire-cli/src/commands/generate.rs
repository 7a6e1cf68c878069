use anyhow::{bail, Result};

use techwire_core::{
    ai::{ContentGenerator, ContentType, GenerationRequest},
    storage::Database,
    AppConfig,
};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    db: &Database,
    config: &AppConfig,
    topic: &str,
    content_type: &str,
    title: Option<String>,
    keywords: Vec<String>,
    length: Option<u32>,
    details: Option<String>,
) -> Result<()> {
    let content_type = match content_type {
        "article" => ContentType::Article,
        "review" => ContentType::Review,
        "news" => ContentType::News,
        other => bail!(
            "Unknown content type '{}' (expected article, review or news)",
            other
        ),
    };

    let generator = ContentGenerator::new(config)?;
    let request = GenerationRequest {
        topic: topic.to_string(),
        content_type,
        title,
        keywords,
        target_length: length,
        product_details: details,
    };

    println!("Generating {}...", content_type.label().to_lowercase());
    let outcome = generator.generate(db, &request).await;

    if outcome.success {
        println!("{}", outcome.message);
        if let Some(slug) = outcome.slug {
            println!("Review the draft with: techwire article show {}", slug);
        }
    } else {
        bail!("Generation failed: {}", outcome.message);
    }

    Ok(())
}
