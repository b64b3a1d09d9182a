//! 任务自动化引擎核心抽象
//!
//! 定义引擎共享的数据模型、能力接口、错误分类和配置模型。
//! 具体实现位于 `robosched-engine`（调度/执行）、`robosched-fanout`
//! （实时广播）和 `robosched-infrastructure`（持久化与外部服务）。

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use errors::{EngineError, EngineResult};

/// `result` 与 `notification` 序列化后的最大长度（字符数）
pub const MAX_VALUE_LENGTH: usize = 2048;
