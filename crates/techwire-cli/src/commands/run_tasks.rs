use anyhow::Result;
use chrono::Utc;

use techwire_core::{scheduler::TaskRunner, storage::Database, AppConfig};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    println!("Running due tasks...");

    let runner = TaskRunner::new(db.clone(), config)?;
    let summary = runner.run_due_tasks(Utc::now()).await?;

    if summary.attempted == 0 {
        println!("No tasks due.");
    } else {
        println!("Done: {}", summary);
    }
    Ok(())
}
