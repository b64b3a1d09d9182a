//! 客户端对账层
//!
//! 维护一份服务端数据的本地镜像：WebSocket 连接收到的变更事件
//! 逐条并入缓存，连接中断由健康检查自动重连，重连成功后全量
//! 重同步覆盖掉线期间丢失的事件。所有派生视图都从镜像即时计算。

pub mod cache;
pub mod connection;
pub mod error;
pub mod resync;

pub use cache::ClientCache;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{classify, FailureKind};
pub use resync::{DataLoader, HttpDataLoader, ResyncSnapshot};
