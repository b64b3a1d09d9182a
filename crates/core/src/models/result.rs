use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 一次执行尝试的持久化结果
///
/// `result` 保存序列化后的 JSON 文本；错误结果以 `is_error = true`
/// 标记，正文形如 `"Error: <message>"`。行一旦写入即不可变，
/// 只会随任务删除被级联删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub result: String,
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

impl TaskResult {
    pub fn success(task_id: Uuid, user_id: Uuid, result: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            user_id,
            result,
            is_error: false,
            created_at: Utc::now(),
        }
    }

    pub fn error(task_id: Uuid, user_id: Uuid, message: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            user_id,
            result: format!("Error: {message}"),
            is_error: true,
            created_at: Utc::now(),
        }
    }

    /// 反序列化保存的结果值，供下一次执行作为 `prevResult` 使用
    pub fn parse_value(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.result).ok()
    }
}
