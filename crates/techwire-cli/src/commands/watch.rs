use anyhow::Result;
use tokio::sync::watch;

use techwire_core::{
    scheduler::{SchedulerService, TaskRunner},
    storage::Database,
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let runner = TaskRunner::new(db.clone(), config)?;
    let service = SchedulerService::new(runner, config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(service.run(shutdown_rx));

    println!(
        "Scheduler running (polling every {}s). Press Ctrl-C to stop.",
        config.sync.scheduler_interval_secs
    );

    tokio::signal::ctrl_c().await?;
    println!("\nStopping...");

    shutdown_tx.send(true)?;
    handle.await?;

    Ok(())
}
