//! 实体变更的实时广播
//!
//! 系统内任何 Collection/Task/Result/Notification 行的变更都会以
//! `{type, action, payload}` 消息投递给记录拥有者的所有活动连接，
//! 绝不跨用户。掉线期间丢失的事件不重放，由客户端全量重同步修复。

pub mod hub;
pub mod server;

pub use hub::FanoutHub;
pub use server::{router, WsState};
