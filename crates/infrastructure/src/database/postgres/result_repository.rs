use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use robosched_core::models::TaskResult;
use robosched_core::traits::ResultRepository;
use robosched_core::EngineResult;

pub struct PostgresResultRepository {
    pool: PgPool,
}

impl PostgresResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_result(row: &sqlx::postgres::PgRow) -> EngineResult<TaskResult> {
        Ok(TaskResult {
            id: row.try_get("id")?,
            task_id: row.try_get("task_id")?,
            user_id: row.try_get("user_id")?,
            result: row.try_get("result")?,
            is_error: row.try_get("is_error")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ResultRepository for PostgresResultRepository {
    async fn insert(&self, result: &TaskResult) -> EngineResult<TaskResult> {
        let row = sqlx::query(
            r#"
            INSERT INTO results (id, task_id, user_id, result, is_error, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, task_id, user_id, result, is_error, created_at
            "#,
        )
        .bind(result.id)
        .bind(result.task_id)
        .bind(result.user_id)
        .bind(&result.result)
        .bind(result.is_error)
        .bind(result.created_at)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_result(&row)
    }

    async fn latest_success(&self, task_id: Uuid) -> EngineResult<Option<TaskResult>> {
        let row = sqlx::query(
            r#"
            SELECT id, task_id, user_id, result, is_error, created_at
            FROM results
            WHERE task_id = $1 AND is_error = false
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_result).transpose()
    }
}
