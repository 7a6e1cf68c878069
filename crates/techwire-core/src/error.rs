use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown task kind: {0}")]
    UnknownTaskKind(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),

    #[error("Content generation error: {0}")]
    Generation(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
