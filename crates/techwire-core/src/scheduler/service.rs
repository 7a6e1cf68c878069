use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::TaskRunner;
use crate::config::AppConfig;

/// Background service that polls for due tasks on a fixed interval
pub struct SchedulerService {
    runner: TaskRunner,
    interval_secs: u64,
}

impl SchedulerService {
    pub fn new(runner: TaskRunner, config: &AppConfig) -> Self {
        Self {
            runner,
            interval_secs: config.sync.scheduler_interval_secs,
        }
    }

    /// Run the polling loop until the shutdown signal flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval_secs == 0 {
            info!("Scheduler disabled (scheduler_interval_secs = 0)");
            let _ = shutdown.changed().await;
            return;
        }

        info!("Scheduler started: polling every {}s", self.interval_secs);

        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick fires immediately
        interval.tick().await;

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_ok() && *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = interval.tick() => {
                    debug!("Checking for due tasks");
                    match self.runner.run_due_tasks(Utc::now()).await {
                        Ok(summary) => {
                            if summary.attempted > 0 {
                                info!("Scheduler pass: {}", summary);
                            }
                        }
                        Err(e) => {
                            error!("Scheduler pass failed: {}", e);
                        }
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }
}
