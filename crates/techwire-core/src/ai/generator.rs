use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::providers::{CompletionParams, CompletionProvider, OpenAiProvider};
use crate::config::AppConfig;
use crate::content::{derive_excerpt, slugify, NewArticle, SourceType};
use crate::seo;
use crate::storage::{ArticleRepository, Database};
use crate::{Error, Result};

/// Kind of article to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Review,
    News,
}

impl ContentType {
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Article => "Article",
            ContentType::Review => "Review",
            ContentType::News => "News",
        }
    }
}

/// Parameters of one generation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Fixed title; when absent a title is generated from the topic
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Target body length in words
    #[serde(default)]
    pub target_length: Option<u32>,
    /// Specs, pricing and other facts to ground a review on
    #[serde(default)]
    pub product_details: Option<String>,
}

/// Result of one generation job; failures are reported, never thrown
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub success: bool,
    pub message: String,
    pub article_id: Option<Uuid>,
    pub slug: Option<String>,
}

impl GenerationOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            article_id: None,
            slug: None,
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a technology journalist writing for an online tech news \
publication. Write engaging, factual, well-structured articles in Markdown. Never invent \
specifications or prices that were not provided.";

/// Generates article drafts from prompts and stores them unpublished
pub struct ContentGenerator {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    max_completion_tokens: u32,
    title_max_tokens: u32,
    temperature: f32,
}

impl ContentGenerator {
    /// Build a generator from configuration; requires an OpenAI API key
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config.ai.api_key().ok_or_else(|| {
            Error::Config(
                "No OpenAI API key configured (set [ai] openai_api_key or OPENAI_API_KEY)"
                    .to_string(),
            )
        })?;

        let provider = Arc::new(OpenAiProvider::new(&api_key, &config.ai.model));
        Ok(Self::with_provider(provider, config))
    }

    /// Build a generator around an arbitrary provider
    pub fn with_provider(provider: Arc<dyn CompletionProvider>, config: &AppConfig) -> Self {
        Self {
            provider,
            model: config.ai.model.clone(),
            max_completion_tokens: config.ai.max_completion_tokens,
            title_max_tokens: config.ai.title_max_tokens,
            temperature: config.ai.temperature,
        }
    }

    /// Run one generation job.
    ///
    /// All failures are folded into the outcome so a scheduler sweep can
    /// record them without special-casing.
    pub async fn generate(&self, db: &Database, request: &GenerationRequest) -> GenerationOutcome {
        match self.try_generate(db, request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Generation failed for topic '{}': {}", request.topic, e);
                GenerationOutcome::failure(e.to_string())
            }
        }
    }

    async fn try_generate(
        &self,
        db: &Database,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome> {
        if request.topic.trim().is_empty() {
            return Ok(GenerationOutcome::failure("Topic must not be empty"));
        }
        if request.content_type == ContentType::Review && request.product_details.is_none() {
            return Ok(GenerationOutcome::failure(
                "Product details are required for review generation",
            ));
        }

        tracing::info!(
            "Generating {} about '{}' with {}",
            request.content_type.label().to_lowercase(),
            request.topic,
            self.model
        );

        let body_params = CompletionParams {
            max_tokens: self.max_completion_tokens,
            temperature: self.temperature,
        };
        let content = self
            .provider
            .complete(SYSTEM_PROMPT, &self.body_prompt(request), &body_params)
            .await?;

        let title = match &request.title {
            Some(title) => title.clone(),
            None => self.generate_title(request).await,
        };

        let slug = slugify(&title);
        let excerpt = derive_excerpt(&content, 300);
        let seo_score = seo::score(
            &title,
            Some(&excerpt),
            &content,
            &request.keywords,
            &slug,
            None,
        );

        let draft = NewArticle {
            title,
            slug,
            content,
            excerpt: Some(excerpt),
            tags: request.keywords.clone(),
            seo_score,
            is_ai_generated: true,
            is_published: false,
            source_type: SourceType::Ai,
            ..Default::default()
        };

        let article = match ArticleRepository::new(db).create(&draft).await {
            Ok(article) => article,
            Err(Error::DuplicateSlug(_)) => {
                let mut retry = draft.clone();
                retry.slug = format!("{}-{}", draft.slug, &Uuid::new_v4().to_string()[..8]);
                ArticleRepository::new(db).create(&retry).await?
            }
            Err(e) => return Err(e),
        };

        tracing::info!("Stored draft '{}' ({})", article.title, article.slug);

        Ok(GenerationOutcome {
            success: true,
            message: format!("Draft created: {}", article.slug),
            article_id: Some(article.id),
            slug: Some(article.slug),
        })
    }

    /// Title generation is best-effort: a failed call falls back to a
    /// deterministic title so the draft is never lost
    async fn generate_title(&self, request: &GenerationRequest) -> String {
        let params = CompletionParams {
            max_tokens: self.title_max_tokens,
            temperature: self.temperature,
        };
        let prompt = format!(
            "Write one SEO-friendly headline of 40 to 65 characters for a {} about: {}. \
             Return only the headline, no quotes.",
            request.content_type.label().to_lowercase(),
            request.topic
        );

        match self.provider.complete(SYSTEM_PROMPT, &prompt, &params).await {
            Ok(title) => title.trim().trim_matches('"').to_string(),
            Err(e) => {
                tracing::warn!("Title generation failed, using fallback: {}", e);
                format!("{} about {}", request.content_type.label(), request.topic)
            }
        }
    }

    fn body_prompt(&self, request: &GenerationRequest) -> String {
        let target_words = request.target_length.unwrap_or(1000);
        let keywords = if request.keywords.is_empty() {
            String::new()
        } else {
            format!(
                "\nWork these keywords in naturally: {}.",
                request.keywords.join(", ")
            )
        };

        match request.content_type {
            ContentType::Review => format!(
                "Write a product review of roughly {target_words} words about: {topic}.\n\
                 Base every claim on these product details:\n{details}\n\
                 Structure it with an introduction, pros, cons, and a verdict section.{keywords}",
                topic = request.topic,
                // Presence is checked before any completion call
                details = request.product_details.as_deref().unwrap_or_default(),
            ),
            ContentType::News => format!(
                "Write a news article of roughly {target_words} words about: {topic}.\n\
                 Use the inverted pyramid: lead with the most important facts, then context, \
                 then background.{keywords}",
                topic = request.topic,
            ),
            ContentType::Article => format!(
                "Write an in-depth article of roughly {target_words} words about: {topic}.\n\
                 Open with a strong introduction, organize the body under Markdown section \
                 headings, and end with a conclusion.{keywords}",
                topic = request.topic,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Provider returning scripted responses in order
    struct ScriptedProvider {
        responses: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            _system: &str,
            user: &str,
            _params: &CompletionParams,
        ) -> Result<String> {
            self.prompts.lock().unwrap().push(user.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(Error::Generation("No scripted response left".into()));
            }
            responses.remove(0)
        }
    }

    fn generator(provider: ScriptedProvider) -> (ContentGenerator, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let config = AppConfig::default();
        (
            ContentGenerator::with_provider(provider.clone(), &config),
            provider,
        )
    }

    #[tokio::test]
    async fn test_generate_stores_unpublished_draft() {
        let db = Database::new_in_memory().await.unwrap();
        let (generator, provider) = generator(ScriptedProvider::new(vec![
            Ok("# Body\n\nA long generated body.".to_string()),
            Ok("Everything About Next-Generation GPU Architectures".to_string()),
        ]));

        let request = GenerationRequest {
            topic: "next-generation GPU architectures".into(),
            content_type: ContentType::Article,
            title: None,
            keywords: vec!["gpu".into(), "hardware".into()],
            target_length: Some(800),
            product_details: None,
        };

        let outcome = generator.generate(&db, &request).await;
        assert!(outcome.success, "{}", outcome.message);

        let slug = outcome.slug.unwrap();
        let article = ArticleRepository::new(&db)
            .find_by_slug(&slug)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            article.title,
            "Everything About Next-Generation GPU Architectures"
        );
        assert!(article.is_ai_generated);
        assert!(!article.is_published);
        assert_eq!(article.source_type, SourceType::Ai);
        assert_eq!(article.tags, vec!["gpu", "hardware"]);
        assert!(article.content.contains("A long generated body"));

        // Body prompt mentions the target length
        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("800 words"));
        assert!(prompts[0].contains("gpu, hardware"));
    }

    #[tokio::test]
    async fn test_review_without_product_details_fails_without_calls() {
        let db = Database::new_in_memory().await.unwrap();
        let (generator, provider) = generator(ScriptedProvider::new(vec![]));

        let request = GenerationRequest {
            topic: "RTX 5090".into(),
            content_type: ContentType::Review,
            title: None,
            keywords: Vec::new(),
            target_length: None,
            product_details: None,
        };

        let outcome = generator.generate(&db, &request).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("Product details are required"));
        assert!(outcome.article_id.is_none());

        // No provider call and no article was stored
        assert!(provider.prompts.lock().unwrap().is_empty());
        assert_eq!(ArticleRepository::new(&db).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_review_prompt_carries_product_details() {
        let db = Database::new_in_memory().await.unwrap();
        let (generator, provider) = generator(ScriptedProvider::new(vec![Ok(
            "Review body".to_string()
        )]));

        let request = GenerationRequest {
            topic: "RTX 5090".into(),
            content_type: ContentType::Review,
            title: Some("RTX 5090 Review: The New Flagship Put to the Test".into()),
            keywords: Vec::new(),
            target_length: None,
            product_details: Some("32 GB GDDR7, 575 W TDP, $1999".into()),
        };

        let outcome = generator.generate(&db, &request).await;
        assert!(outcome.success, "{}", outcome.message);

        // Explicit title skips the title call
        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("32 GB GDDR7"));
        assert!(prompts[0].contains("verdict"));
    }

    #[tokio::test]
    async fn test_provider_error_becomes_failed_outcome() {
        let db = Database::new_in_memory().await.unwrap();
        let (generator, _) = generator(ScriptedProvider::new(vec![Err(Error::Generation(
            "rate limited".into(),
        ))]));

        let request = GenerationRequest {
            topic: "anything".into(),
            content_type: ContentType::News,
            title: None,
            keywords: Vec::new(),
            target_length: None,
            product_details: None,
        };

        let outcome = generator.generate(&db, &request).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("rate limited"));
        assert_eq!(ArticleRepository::new(&db).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_title_failure_falls_back() {
        let db = Database::new_in_memory().await.unwrap();
        let (generator, _) = generator(ScriptedProvider::new(vec![
            Ok("Body text".to_string()),
            Err(Error::Generation("timeout".into())),
        ]));

        let request = GenerationRequest {
            topic: "quantum networking".into(),
            content_type: ContentType::News,
            title: None,
            keywords: Vec::new(),
            target_length: None,
            product_details: None,
        };

        let outcome = generator.generate(&db, &request).await;
        assert!(outcome.success);

        let article = ArticleRepository::new(&db)
            .find_by_slug(&outcome.slug.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(article.title, "News about quantum networking");
    }

    #[tokio::test]
    async fn test_duplicate_slug_gets_suffix() {
        let db = Database::new_in_memory().await.unwrap();
        let (generator, _) = generator(ScriptedProvider::new(vec![
            Ok("First body".to_string()),
            Ok("Second body".to_string()),
        ]));

        let request = GenerationRequest {
            topic: "same topic".into(),
            content_type: ContentType::Article,
            title: Some("The Exact Same Title".into()),
            keywords: Vec::new(),
            target_length: None,
            product_details: None,
        };

        let first = generator.generate(&db, &request).await;
        let second = generator.generate(&db, &request).await;
        assert!(first.success);
        assert!(second.success, "{}", second.message);

        let first_slug = first.slug.unwrap();
        let second_slug = second.slug.unwrap();
        assert_ne!(first_slug, second_slug);
        assert!(second_slug.starts_with(&first_slug));
    }

    #[test]
    fn test_request_from_json() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{
                "topic": "AI accelerators",
                "type": "review",
                "product_details": "TPU v6, 256 chips"
            }"#,
        )
        .unwrap();

        assert_eq!(request.content_type, ContentType::Review);
        assert!(request.keywords.is_empty());
        assert!(request.target_length.is_none());
        assert_eq!(request.product_details.as_deref(), Some("TPU v6, 256 chips"));
    }
}
