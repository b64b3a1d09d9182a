use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use robosched_core::models::{
    ChangeAction, Collection, EntityKind, Notification, Task, TaskResult, User, WireEvent,
};

use crate::resync::ResyncSnapshot;

/// 服务端数据的本地镜像
///
/// 按实体 id 建键。并入规则：insert 无条件写入，update 仅在本地
/// 已有该行时替换，delete 按 id 移除。两个例外：Result 行不可变，
/// update 一律忽略；Notification 的 update 只在 `is_read: true` 时
/// 把它移出未读视图（重复应用无副作用）。会话用户被删除时整个
/// 镜像清空。每次实际变更令修订号加一，订阅方据此刷新。
pub struct ClientCache {
    inner: Mutex<CacheInner>,
    revision: watch::Sender<u64>,
}

#[derive(Debug, Default)]
struct CacheInner {
    user: Option<User>,
    collections: HashMap<Uuid, Collection>,
    tasks: HashMap<Uuid, Task>,
    results: HashMap<Uuid, TaskResult>,
    unread: HashMap<Uuid, Notification>,
}

impl Default for ClientCache {
    fn default() -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            revision: watch::Sender::new(0),
        }
    }
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅修订号，任何实际变更后收到通知
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// 用重同步快照整体替换镜像
    pub fn replace_all(&self, snapshot: ResyncSnapshot) {
        let mut inner = self.inner.lock().unwrap();
        inner.user = snapshot.user;
        inner.collections = snapshot.collections.into_iter().map(|c| (c.id, c)).collect();
        inner.tasks = snapshot.tasks.into_iter().map(|t| (t.id, t)).collect();
        inner.results = snapshot.results.into_iter().map(|r| (r.id, r)).collect();
        inner.unread = snapshot
            .notifications
            .into_iter()
            .filter(|n| !n.is_read)
            .map(|n| (n.id, n))
            .collect();
        drop(inner);
        self.bump();
    }

    /// 把一条变更事件并入镜像
    pub fn apply(&self, event: &WireEvent) {
        let mut inner = self.inner.lock().unwrap();
        let changed = match event.kind {
            EntityKind::Collection => apply_keyed(&mut inner.collections, event),
            EntityKind::Task => apply_keyed(&mut inner.tasks, event),
            // Result 行写入后不可变，update 不携带新信息
            EntityKind::Result => match event.action {
                ChangeAction::Update => false,
                _ => apply_keyed(&mut inner.results, event),
            },
            EntityKind::Notification => apply_notification(&mut inner.unread, event),
            EntityKind::User => apply_user(&mut inner, event),
        };
        drop(inner);
        if changed {
            self.bump();
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub fn session_user(&self) -> Option<User> {
        self.inner.lock().unwrap().user.clone()
    }

    pub fn collections(&self) -> Vec<Collection> {
        let mut list: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .collections
            .values()
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    pub fn tasks(&self) -> Vec<Task> {
        let mut list: Vec<_> = self.inner.lock().unwrap().tasks.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    pub fn tasks_in_collection(&self, collection_id: Uuid) -> Vec<Task> {
        let mut list: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .tasks
            .values()
            .filter(|t| t.collection_id == collection_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    /// 任务最近一次执行的结果
    pub fn latest_result(&self, task_id: Uuid) -> Option<TaskResult> {
        self.inner
            .lock()
            .unwrap()
            .results
            .values()
            .filter(|r| r.task_id == task_id)
            .max_by_key(|r| r.created_at)
            .cloned()
    }

    /// 最近一次执行以错误收场的任务
    pub fn tasks_with_error(&self) -> Vec<Task> {
        let inner = self.inner.lock().unwrap();
        let mut list: Vec<_> = inner
            .tasks
            .values()
            .filter(|t| {
                inner
                    .results
                    .values()
                    .filter(|r| r.task_id == t.id)
                    .max_by_key(|r| r.created_at)
                    .is_some_and(|r| r.is_error)
            })
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    pub fn unread_count(&self) -> usize {
        self.inner.lock().unwrap().unread.len()
    }

    pub fn unread_notifications(&self) -> Vec<Notification> {
        let mut list: Vec<_> = self.inner.lock().unwrap().unread.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }
}

fn payload_id(payload: &Value) -> Option<Uuid> {
    payload.get("id")?.as_str()?.parse().ok()
}

fn apply_keyed<T: DeserializeOwned>(map: &mut HashMap<Uuid, T>, event: &WireEvent) -> bool {
    let Some(id) = payload_id(&event.payload) else {
        warn!("变更事件缺少可解析的 id: {:?}", event.kind);
        return false;
    };
    match event.action {
        ChangeAction::Insert => match serde_json::from_value::<T>(event.payload.clone()) {
            Ok(row) => {
                map.insert(id, row);
                true
            }
            Err(e) => {
                warn!("{:?} insert 负载解析失败: {}", event.kind, e);
                false
            }
        },
        ChangeAction::Update => {
            if !map.contains_key(&id) {
                return false;
            }
            match serde_json::from_value::<T>(event.payload.clone()) {
                Ok(row) => {
                    map.insert(id, row);
                    true
                }
                Err(e) => {
                    warn!("{:?} update 负载解析失败: {}", event.kind, e);
                    false
                }
            }
        }
        ChangeAction::Delete => map.remove(&id).is_some(),
    }
}

fn apply_notification(unread: &mut HashMap<Uuid, Notification>, event: &WireEvent) -> bool {
    let payload_is_read = event
        .payload
        .get("is_read")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    match event.action {
        // 未读视图只收未读行，已读的 insert 与快照过滤保持一致
        ChangeAction::Insert => {
            if payload_is_read {
                return false;
            }
            apply_keyed(unread, event)
        }
        // 通知只会从未读翻成已读，届时移出未读视图即可
        ChangeAction::Update => {
            if !payload_is_read {
                return false;
            }
            match payload_id(&event.payload) {
                Some(id) => unread.remove(&id).is_some(),
                None => false,
            }
        }
        ChangeAction::Delete => match payload_id(&event.payload) {
            Some(id) => unread.remove(&id).is_some(),
            None => false,
        },
    }
}

fn apply_user(inner: &mut CacheInner, event: &WireEvent) -> bool {
    match event.action {
        ChangeAction::Insert | ChangeAction::Update => {
            match serde_json::from_value::<User>(event.payload.clone()) {
                Ok(user) => {
                    inner.user = Some(user);
                    true
                }
                Err(e) => {
                    warn!("user 负载解析失败: {}", e);
                    false
                }
            }
        }
        // 账号被删除，整个会话作废
        ChangeAction::Delete => {
            debug!("会话用户已删除，清空本地镜像");
            *inner = CacheInner::default();
            true
        }
    }
}
