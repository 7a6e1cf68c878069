use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::scheduler::{Frequency, NewTask, RunStatus, ScheduledTask, TaskKind};
use crate::Result;

/// Repository for scheduled task records
pub struct TaskRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct TaskRow {
    id: String,
    name: String,
    kind: String,
    frequency: String,
    config: String,
    is_active: i32,
    last_run_at: Option<DateTime<Utc>>,
    run_count: i64,
    error_count: i64,
    last_run_status: Option<String>,
    last_run_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for ScheduledTask {
    fn from(row: TaskRow) -> Self {
        ScheduledTask {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            name: row.name,
            kind: TaskKind::parse(&row.kind),
            frequency: Frequency::parse(&row.frequency),
            config: serde_json::from_str(&row.config)
                .unwrap_or(serde_json::Value::Object(Default::default())),
            is_active: row.is_active != 0,
            last_run_at: row.last_run_at,
            run_count: row.run_count,
            error_count: row.error_count,
            last_run_status: row.last_run_status.as_deref().and_then(RunStatus::parse),
            last_run_message: row.last_run_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const TASK_COLUMNS: &str = r#"
    id, name, kind, frequency, config, is_active, last_run_at, run_count,
    error_count, last_run_status, last_run_message, created_at, updated_at
"#;

impl<'a> TaskRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new scheduled task
    pub async fn create(&self, new_task: &NewTask) -> Result<ScheduledTask> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO scheduled_tasks (id, name, kind, frequency, config, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_task.name)
        .bind(new_task.kind.as_str())
        .bind(new_task.frequency.canonical())
        .bind(serde_json::to_string(&new_task.config)?)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| crate::Error::Config(format!("task {} not found after insert", id)))
    }

    /// Find a task by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledTask>> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM scheduled_tasks WHERE id = ?",
            TASK_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(ScheduledTask::from))
    }

    /// Get all tasks
    pub async fn list_all(&self) -> Result<Vec<ScheduledTask>> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM scheduled_tasks ORDER BY name ASC",
            TASK_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(ScheduledTask::from).collect())
    }

    /// Get active tasks in creation order, the order the scheduler runs them
    pub async fn list_active(&self) -> Result<Vec<ScheduledTask>> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM scheduled_tasks WHERE is_active = 1 ORDER BY created_at ASC",
            TASK_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(ScheduledTask::from).collect())
    }

    /// Record one run attempt.
    ///
    /// run_count increments exactly once per attempt; error_count only on
    /// failure. last_run_at never moves backwards.
    pub async fn record_run(
        &self,
        id: Uuid,
        ran_at: DateTime<Utc>,
        status: RunStatus,
        message: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE scheduled_tasks
            SET last_run_at = MAX(COALESCE(last_run_at, ?), ?),
                run_count = run_count + 1,
                error_count = error_count + ?,
                last_run_status = ?,
                last_run_message = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(ran_at)
        .bind(ran_at)
        .bind(matches!(status, RunStatus::Failure) as i32)
        .bind(status.as_str())
        .bind(message)
        .bind(ran_at)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Enable or disable a task
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        let now = Utc::now();

        sqlx::query("UPDATE scheduled_tasks SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active as i32)
            .bind(now)
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}
