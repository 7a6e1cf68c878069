use anyhow::{Context, Result};
use uuid::Uuid;

use techwire_core::{
    scheduler::{Frequency, NewTask, TaskKind},
    storage::{Database, TaskRepository},
};

pub async fn add(
    db: &Database,
    name: &str,
    kind: &str,
    frequency: &str,
    config_path: Option<std::path::PathBuf>,
) -> Result<()> {
    let kind = TaskKind::parse(kind);
    let frequency = Frequency::parse(frequency);

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read task config {}", path.display()))?;
            serde_json::from_str(&content).context("Invalid task config JSON")?
        }
        None => serde_json::json!({}),
    };

    let task = TaskRepository::new(db)
        .create(&NewTask {
            name: name.to_string(),
            kind,
            frequency,
            config,
        })
        .await?;

    println!(
        "Created task: {} ({}, {})",
        task.name,
        task.kind.as_str(),
        task.frequency
    );
    println!("  id: {}", task.id);
    Ok(())
}

pub async fn list(db: &Database) -> Result<()> {
    let tasks = TaskRepository::new(db).list_all().await?;

    if tasks.is_empty() {
        println!("No scheduled tasks yet.");
        println!("\nTo schedule a task, run:");
        println!("  techwire task add -n <name> -k rss -f hourly");
        return Ok(());
    }

    println!("Scheduled tasks ({}):\n", tasks.len());

    for task in &tasks {
        let state = if task.is_active { "" } else { " [disabled]" };
        println!(
            "  {} - {} ({}, {}){}",
            task.id,
            task.name,
            task.kind.as_str(),
            task.frequency,
            state
        );
        println!(
            "    Runs: {} ({} errors)",
            task.run_count, task.error_count
        );
        if let Some(last) = task.last_run_at {
            let status = task
                .last_run_status
                .map(|s| s.as_str())
                .unwrap_or("unknown");
            println!("    Last run: {} ({})", last.format("%Y-%m-%d %H:%M"), status);
        }
        if let Some(message) = &task.last_run_message {
            println!("    Last message: {}", message);
        }
        println!();
    }

    Ok(())
}

pub async fn set_active(db: &Database, id: Uuid, is_active: bool) -> Result<()> {
    let repo = TaskRepository::new(db);
    if repo.find_by_id(id).await?.is_none() {
        anyhow::bail!("No task with id {}", id);
    }

    repo.set_active(id, is_active).await?;
    println!(
        "Task {} is now {}",
        id,
        if is_active { "enabled" } else { "disabled" }
    );
    Ok(())
}
