use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 实时广播涉及的实体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Collection,
    Task,
    Result,
    Notification,
    User,
}

/// 实体变更动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// 实体变更事件
///
/// `user_id` 仅用于路由（只投递给记录拥有者的连接），
/// 不随消息本体下发。同一实体的事件按提交顺序投递，
/// 不同实体之间不保证顺序。
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub user_id: Uuid,
    pub kind: EntityKind,
    pub action: ChangeAction,
    pub payload: Value,
}

impl ChangeEvent {
    pub fn new(user_id: Uuid, kind: EntityKind, action: ChangeAction, payload: Value) -> Self {
        Self {
            user_id,
            kind,
            action,
            payload,
        }
    }

    /// 下发给客户端的线格式消息体
    pub fn to_wire(&self) -> WireEvent {
        WireEvent {
            kind: self.kind,
            action: self.action,
            payload: self.payload.clone(),
        }
    }
}

/// 服务端到客户端的线格式：`{type, action, payload}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub action: ChangeAction,
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_event_format() {
        let event = ChangeEvent::new(
            Uuid::new_v4(),
            EntityKind::Notification,
            ChangeAction::Update,
            json!({"id": "n1", "is_read": true}),
        );
        let text = serde_json::to_string(&event.to_wire()).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed["type"], "notification");
        assert_eq!(parsed["action"], "update");
        assert_eq!(parsed["payload"]["is_read"], true);
    }
}
