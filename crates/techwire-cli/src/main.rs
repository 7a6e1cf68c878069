use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use techwire_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "techwire")]
#[command(author, version, about = "Content ingestion pipeline for a tech news site")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage content sources
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },
    /// Manage scheduled tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Manage articles
    Article {
        #[command(subcommand)]
        action: ArticleAction,
    },
    /// Fetch all active RSS sources now
    Fetch,
    /// Scrape all active scrape sources now
    Scrape,
    /// Generate an article draft with AI
    Generate {
        /// Topic to write about
        #[arg(short, long)]
        topic: String,
        /// Content type: article, review or news
        #[arg(short = 'k', long = "type", default_value = "article")]
        content_type: String,
        /// Fixed title (generated from the topic when omitted)
        #[arg(long)]
        title: Option<String>,
        /// Keywords to work in, repeatable
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        /// Target body length in words
        #[arg(long)]
        length: Option<u32>,
        /// Product details to ground a review on (required for reviews)
        #[arg(long)]
        details: Option<String>,
    },
    /// Run all due scheduled tasks once
    Run,
    /// Run the scheduler loop until interrupted
    Watch,
}

#[derive(Subcommand)]
enum SourceAction {
    /// Register a new source
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Feed or site URL
        #[arg(short, long)]
        url: String,
        /// Source kind: rss or scrape
        #[arg(short, long, default_value = "rss")]
        kind: String,
        /// Category attached to fetched articles
        #[arg(short, long)]
        category: Option<String>,
        /// Fetch frequency in minutes
        #[arg(short, long, default_value = "60")]
        frequency: u32,
        /// Path to a scrape plan JSON file (scrape sources only)
        #[arg(short, long)]
        plan: Option<std::path::PathBuf>,
    },
    /// List all sources
    List,
    /// Enable a source
    Enable { id: uuid::Uuid },
    /// Disable a source
    Disable { id: uuid::Uuid },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Schedule a new task
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Task kind: rss, scrape or ai_generate
        #[arg(short, long)]
        kind: String,
        /// Frequency: hourly, daily, weekly, monthly, or minutes
        #[arg(short, long, default_value = "daily")]
        frequency: String,
        /// Path to a task config JSON file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },
    /// List all tasks
    List,
    /// Enable a task
    Enable { id: uuid::Uuid },
    /// Disable a task
    Disable { id: uuid::Uuid },
}

#[derive(Subcommand)]
enum ArticleAction {
    /// Submit an article manually
    New {
        /// Article title
        #[arg(short, long)]
        title: String,
        /// Path to a Markdown file with the article body
        #[arg(short, long)]
        file: std::path::PathBuf,
        /// Category
        #[arg(short, long)]
        category: Option<String>,
        /// Tags, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Cover image URL
        #[arg(long)]
        cover: Option<String>,
    },
    /// List recent articles
    List {
        /// Maximum number of articles to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
    /// Search articles by title or content
    Search { query: String },
    /// Show one article by slug
    Show { slug: String },
    /// Publish a draft
    Publish { slug: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize database
    let db = Database::new(&config).await?;

    match cli.command {
        Commands::Source { action } => match action {
            SourceAction::Add {
                name,
                url,
                kind,
                category,
                frequency,
                plan,
            } => {
                commands::source::add(&db, &name, &url, &kind, category, frequency, plan).await
            }
            SourceAction::List => commands::source::list(&db).await,
            SourceAction::Enable { id } => commands::source::set_active(&db, id, true).await,
            SourceAction::Disable { id } => commands::source::set_active(&db, id, false).await,
        },
        Commands::Task { action } => match action {
            TaskAction::Add {
                name,
                kind,
                frequency,
                config: task_config,
            } => commands::task::add(&db, &name, &kind, &frequency, task_config).await,
            TaskAction::List => commands::task::list(&db).await,
            TaskAction::Enable { id } => commands::task::set_active(&db, id, true).await,
            TaskAction::Disable { id } => commands::task::set_active(&db, id, false).await,
        },
        Commands::Article { action } => match action {
            ArticleAction::New {
                title,
                file,
                category,
                tags,
                cover,
            } => commands::article::new(&db, &title, &file, category, tags, cover).await,
            ArticleAction::List { limit } => commands::article::list(&db, limit).await,
            ArticleAction::Search { query } => commands::article::search(&db, &query).await,
            ArticleAction::Show { slug } => commands::article::show(&db, &slug).await,
            ArticleAction::Publish { slug } => commands::article::publish(&db, &slug).await,
        },
        Commands::Fetch => commands::fetch::run(&db, &config).await,
        Commands::Scrape => commands::scrape::run(&db, &config).await,
        Commands::Generate {
            topic,
            content_type,
            title,
            keywords,
            length,
            details,
        } => {
            commands::generate::run(&db, &config, &topic, &content_type, title, keywords, length, details)
                .await
        }
        Commands::Run => commands::run_tasks::run(&db, &config).await,
        Commands::Watch => commands::watch::run(&db, &config).await,
    }
}
