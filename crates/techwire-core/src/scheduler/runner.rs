use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{RunStatus, ScheduledTask, TaskKind};
use crate::ai::{ContentGenerator, GenerationRequest};
use crate::config::AppConfig;
use crate::rss::{sweep_rss_sources, FeedFetcher};
use crate::scrape::{sweep_scrape_sources, HttpPageLoader, PageLoader};
use crate::storage::{Database, TaskRepository};
use crate::{Error, Result};

/// Aggregate result of one scheduler pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} attempted, {} succeeded, {} failed",
            self.attempted, self.succeeded, self.failed
        )
    }
}

/// Executes due scheduled tasks against their handlers
pub struct TaskRunner {
    db: Database,
    fetcher: FeedFetcher,
    loader: Arc<dyn PageLoader>,
    generator: Option<ContentGenerator>,
    config: AppConfig,
}

impl TaskRunner {
    /// Build a runner from configuration.
    ///
    /// The generator is optional: rss/scrape-only deployments need no API
    /// key, and AI tasks then fail with a recorded error.
    pub fn new(db: Database, config: &AppConfig) -> Result<Self> {
        let fetcher = FeedFetcher::new(config)?;
        let loader = Arc::new(HttpPageLoader::new(config)?);

        let generator = match ContentGenerator::new(config) {
            Ok(generator) => Some(generator),
            Err(e) => {
                tracing::warn!("AI generation disabled: {}", e);
                None
            }
        };

        Ok(Self {
            db,
            fetcher,
            loader,
            generator,
            config: config.clone(),
        })
    }

    /// Build a runner around explicit components
    pub fn with_components(
        db: Database,
        fetcher: FeedFetcher,
        loader: Arc<dyn PageLoader>,
        generator: Option<ContentGenerator>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            fetcher,
            loader,
            generator,
            config,
        }
    }

    /// Run every active task that is due at `now`.
    ///
    /// Each attempt is recorded on the task row; one failing task never
    /// stops the pass. Only datastore errors propagate.
    pub async fn run_due_tasks(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let task_repo = TaskRepository::new(&self.db);

        let tasks = task_repo.list_active().await?;
        let mut summary = RunSummary::default();

        for task in tasks {
            if !task.should_run(now) {
                tracing::debug!("Task '{}' not due, skipping", task.name);
                continue;
            }

            summary.attempted += 1;
            tracing::info!("Running task '{}' ({})", task.name, task.kind.as_str());

            match self.dispatch(&task).await {
                Ok(message) => {
                    task_repo
                        .record_run(task.id, Utc::now(), RunStatus::Success, &message)
                        .await?;
                    summary.succeeded += 1;
                    tracing::info!("Task '{}' succeeded: {}", task.name, message);
                }
                Err(Error::Database(e)) => return Err(Error::Database(e)),
                Err(e) => {
                    task_repo
                        .record_run(task.id, Utc::now(), RunStatus::Failure, &e.to_string())
                        .await?;
                    summary.failed += 1;
                    tracing::error!("Task '{}' failed: {}", task.name, e);
                }
            }
        }

        Ok(summary)
    }

    async fn dispatch(&self, task: &ScheduledTask) -> Result<String> {
        match task.kind {
            TaskKind::Rss => {
                let outcome = sweep_rss_sources(&self.db, &self.fetcher).await?;
                Ok(outcome.to_string())
            }
            TaskKind::Scrape => {
                let outcome =
                    sweep_scrape_sources(&self.db, self.loader.as_ref(), &self.config).await?;
                Ok(outcome.to_string())
            }
            TaskKind::AiGenerate => {
                let generator = self.generator.as_ref().ok_or_else(|| {
                    Error::Config("AI generation is not configured (no API key)".to_string())
                })?;

                let params = task.config.get("ai_generation_params").ok_or_else(|| {
                    Error::Config("Task config is missing ai_generation_params".to_string())
                })?;
                let request: GenerationRequest = serde_json::from_value(params.clone())
                    .map_err(|e| Error::Config(format!("Invalid ai_generation_params: {}", e)))?;

                let outcome = generator.generate(&self.db, &request).await;
                if outcome.success {
                    Ok(outcome.message)
                } else {
                    Err(Error::Generation(outcome.message))
                }
            }
            TaskKind::Maintenance => {
                Err(Error::UnknownTaskKind(task.kind.as_str().to_string()))
            }
        }
    }
}
