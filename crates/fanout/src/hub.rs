use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use robosched_core::models::ChangeEvent;
use robosched_core::traits::EventPublisher;

/// 按用户维护活动连接的广播中心
///
/// 每条连接一个无界发送队列；发布时在同一把锁内按注册顺序投递，
/// 保证同一实体的事件按提交顺序到达每条连接。发送失败的连接
/// 视为已断开，就地剔除（丢失的事件由客户端重同步恢复）。
#[derive(Debug, Default)]
pub struct FanoutHub {
    connections: Mutex<HashMap<Uuid, Vec<ClientConnection>>>,
    next_conn_id: AtomicU64,
}

#[derive(Debug)]
struct ClientConnection {
    id: u64,
    tx: mpsc::UnboundedSender<String>,
}

impl FanoutHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一条属于 `user_id` 的连接，返回连接标识与接收端
    pub fn register(&self, user_id: Uuid) -> (u64, mpsc::UnboundedReceiver<String>) {
        let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut connections = self.connections.lock().unwrap();
        connections
            .entry(user_id)
            .or_default()
            .push(ClientConnection { id, tx });
        debug!("用户 {} 注册连接 {}", user_id, id);
        (id, rx)
    }

    pub fn unregister(&self, user_id: Uuid, conn_id: u64) {
        let mut connections = self.connections.lock().unwrap();
        if let Some(list) = connections.get_mut(&user_id) {
            list.retain(|c| c.id != conn_id);
            if list.is_empty() {
                connections.remove(&user_id);
            }
        }
        debug!("用户 {} 的连接 {} 已注销", user_id, conn_id);
    }

    /// 踢掉某个用户的全部连接（例如账号被删除时）
    ///
    /// 丢弃发送端即可令对应的转发循环收到通道关闭并挂断 socket。
    pub fn disconnect_user(&self, user_id: Uuid) {
        let removed = self.connections.lock().unwrap().remove(&user_id);
        if let Some(list) = removed {
            debug!("用户 {} 的 {} 条连接已被踢掉", user_id, list.len());
        }
    }

    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.connections
            .lock()
            .unwrap()
            .get(&user_id)
            .map_or(0, |list| list.len())
    }
}

impl EventPublisher for FanoutHub {
    fn publish(&self, event: ChangeEvent) {
        let text = match serde_json::to_string(&event.to_wire()) {
            Ok(text) => text,
            Err(e) => {
                warn!("变更事件序列化失败: {}", e);
                return;
            }
        };

        let mut connections = self.connections.lock().unwrap();
        if let Some(list) = connections.get_mut(&event.user_id) {
            // 只投递给记录拥有者的连接
            list.retain(|c| c.tx.send(text.clone()).is_ok());
            if list.is_empty() {
                connections.remove(&event.user_id);
            }
        }
    }
}
