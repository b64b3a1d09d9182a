use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use robosched_core::models::Task;
use robosched_core::traits::TaskRepository;
use robosched_core::{EngineError, EngineResult};

const TASK_COLUMNS: &str =
    r#"id, user_id, collection_id, name, description, code, "interval", active, next_run, created_at"#;

pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: &sqlx::postgres::PgRow) -> EngineResult<Task> {
        Ok(Task {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            collection_id: row.try_get("collection_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            code: row.try_get("code")?,
            interval: row.try_get("interval")?,
            active: row.try_get("active")?,
            next_run: row.try_get("next_run")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn find_due(&self, now: DateTime<Utc>) -> EngineResult<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE next_run <= $1 AND active = true ORDER BY next_run ASC"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let tasks = rows
            .iter()
            .map(Self::row_to_task)
            .collect::<EngineResult<Vec<_>>>()?;
        debug!("到期任务查询命中 {} 行", tasks.len());
        Ok(tasks)
    }

    async fn reschedule(&self, id: Uuid, next_run: DateTime<Utc>) -> EngineResult<()> {
        let result = sqlx::query("UPDATE tasks SET next_run = $2 WHERE id = $1")
            .bind(id)
            .bind(next_run)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(EngineError::TaskNotFound { id });
        }
        Ok(())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> EngineResult<()> {
        let result = sqlx::query("UPDATE tasks SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(EngineError::TaskNotFound { id });
        }
        Ok(())
    }

    async fn create(&self, task: &Task) -> EngineResult<Task> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tasks (id, user_id, collection_id, name, description, code, "interval", active, next_run, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(task.user_id)
        .bind(task.collection_id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(&task.code)
        .bind(task.interval)
        .bind(task.active)
        .bind(task.next_run)
        .bind(task.created_at)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_task(&row)
    }
}
