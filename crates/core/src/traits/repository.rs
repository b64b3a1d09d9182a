//! 数据仓储层接口定义
//!
//! 持久化引擎被视为满足 find/insert/update 操作的能力，
//! 查询语言本身不在本系统范围内。接口与实现分离：
//! - PostgreSQL 实现位于 `robosched-infrastructure`
//! - 内存实现（测试用）位于 `robosched-testing-utils`
//!
//! Result 与 Notification 行只由引擎创建，写入后不可变，
//! 对系统其余部分只读暴露。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Notification, Task, TaskResult, User};
use crate::EngineResult;

/// 任务仓储接口
///
/// 任务行的编辑/删除属于外部 CRUD 接口，引擎只依赖到期查询、
/// 调度字段的推进和建行（建行同时服务于测试夹具）。
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 查询所有到期任务：`active = true AND next_run <= now`，
    /// 按 `next_run` 升序返回（容量受限时先调度最早到期者）
    async fn find_due(&self, now: DateTime<Utc>) -> EngineResult<Vec<Task>>;

    /// 推进任务的下一次运行时间（只向前）
    async fn reschedule(&self, id: Uuid, next_run: DateTime<Utc>) -> EngineResult<()>;

    /// 失败后禁用任务；重新启用由外部 CRUD 接口负责
    async fn set_active(&self, id: Uuid, active: bool) -> EngineResult<()>;

    async fn create(&self, task: &Task) -> EngineResult<Task>;
}

/// 执行结果仓储接口
#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn insert(&self, result: &TaskResult) -> EngineResult<TaskResult>;

    /// 最近一次非错误结果，作为下次执行的 `prevResult`
    async fn latest_success(&self, task_id: Uuid) -> EngineResult<Option<TaskResult>>;
}

/// 通知仓储接口（通知行只由引擎创建，读取走外部查询接口）
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> EngineResult<Notification>;
}

/// 用户仓储接口（只读，账户管理在外部系统）
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> EngineResult<Option<User>>;
}

/// 会话令牌校验能力
///
/// 认证与会话签发是外部协作者，广播服务只需要把令牌换成用户 id。
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> EngineResult<Uuid>;
}
