use async_trait::async_trait;
use sqlx::{PgPool, Row};

use robosched_core::models::Notification;
use robosched_core::traits::NotificationRepository;
use robosched_core::EngineResult;

pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_notification(row: &sqlx::postgres::PgRow) -> EngineResult<Notification> {
        Ok(Notification {
            id: row.try_get("id")?,
            task_id: row.try_get("task_id")?,
            user_id: row.try_get("user_id")?,
            result_id: row.try_get("result_id")?,
            notification: row.try_get("notification")?,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, notification: &Notification) -> EngineResult<Notification> {
        let row = sqlx::query(
            r#"
            INSERT INTO notifications (id, task_id, user_id, result_id, notification, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, task_id, user_id, result_id, notification, is_read, created_at
            "#,
        )
        .bind(notification.id)
        .bind(notification.task_id)
        .bind(notification.user_id)
        .bind(notification.result_id)
        .bind(&notification.notification)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_notification(&row)
    }
}
