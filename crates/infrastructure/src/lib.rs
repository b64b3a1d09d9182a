//! 外部协作者的具体实现
//!
//! PostgreSQL 仓储、HTTP 代码执行服务、SparkPost 邮件发送和
//! 会话令牌校验。所有实现都只暴露 `robosched-core` 里的能力接口。

pub mod auth;
pub mod database;
pub mod mailer;
pub mod runner;

pub use auth::HttpTokenValidator;
pub use database::manager::connect_pool;
pub use database::postgres::{
    PostgresNotificationRepository, PostgresResultRepository, PostgresTaskRepository,
    PostgresUserRepository,
};
pub use mailer::SparkpostMailer;
pub use runner::HttpCodeRunner;
