use crate::models::ChangeEvent;

/// 实体变更事件发布接口
///
/// 系统内任何对 Collection/Task/Result/Notification 行的变更都
/// 通过此接口发布，由实现方（广播中心）投递给拥有者的活动连接。
/// 发布是同步且非阻塞的；掉线连接上的丢失事件通过客户端全量
/// 重同步恢复，而不是重放。
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

/// 丢弃所有事件的空实现
#[derive(Debug, Default, Clone)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: ChangeEvent) {}
}
