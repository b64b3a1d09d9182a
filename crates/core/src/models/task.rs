use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任务定义
///
/// 用户编写的定时脚本任务。`code` 为不透明脚本文本，由外部执行能力运行；
/// `interval` 以分钟计，必须为正整数。
///
/// # 调度不变量
///
/// - 任务可执行当且仅当 `active == true && next_run <= now`
/// - `next_run` 只会向前推进
/// - `code` 与 `interval` 可能在两次执行之间被 CRUD 接口修改，
///   调度器每个周期都读取最新行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub collection_id: Uuid,
    pub name: String,
    pub description: String,
    pub code: String,
    pub interval: i64, // 分钟
    pub active: bool,
    pub next_run: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        user_id: Uuid,
        collection_id: Uuid,
        name: String,
        description: String,
        code: String,
        interval: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            collection_id,
            name,
            description,
            code,
            interval,
            active: false,
            next_run: now,
            created_at: now,
        }
    }

    /// 任务在 `now` 时刻是否到期可执行
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && self.next_run <= now
    }

    /// 成功执行后的下一次运行时间（`now + interval` 分钟）
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_due_only_when_active() {
        let mut task = Task::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "t".to_string(),
            String::new(),
            String::new(),
            60,
        );
        let now = Utc::now();
        task.next_run = now - Duration::minutes(1);

        assert!(!task.is_due(now));
        task.active = true;
        assert!(task.is_due(now));
        task.next_run = now + Duration::minutes(1);
        assert!(!task.is_due(now));
    }

    #[test]
    fn test_next_run_advances_by_interval() {
        let mut task = Task::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "t".to_string(),
            String::new(),
            String::new(),
            60,
        );
        task.interval = 60;
        let now = Utc::now();
        assert_eq!(task.next_run_after(now), now + Duration::minutes(60));
    }
}
