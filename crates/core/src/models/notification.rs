use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户通知
///
/// 仅在成功且非错误的 Result 带有非空字符串通知时创建，
/// `result_id` 回指对应的结果行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub result_id: Uuid,
    pub notification: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(task_id: Uuid, user_id: Uuid, result_id: Uuid, notification: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            user_id,
            result_id,
            notification,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
