//! 定时任务执行引擎
//!
//! 每个调度周期选出所有到期任务并发执行：Invoker 负责调用不透明的
//! 代码执行能力并校验契约，Outcome Handler 负责结果/通知落库、
//! 失败禁用与重新排期，全部变更通过 `EventPublisher` 实时广播。

pub mod invoker;
pub mod notify;
pub mod outcome;
pub mod scheduler;

pub use invoker::ExecutionInvoker;
pub use notify::EmailNotifier;
pub use outcome::OutcomeHandler;
pub use scheduler::{CycleEngine, CycleSummary};
