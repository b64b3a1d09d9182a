use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use robosched_core::models::{
    ChangeAction, ChangeEvent, EntityKind, ExecutionOutcome, Notification, Task, TaskResult,
};
use robosched_core::traits::{
    EventPublisher, NotificationRepository, ResultRepository, TaskRepository, UserRepository,
};
use robosched_core::EngineResult;

use crate::notify::EmailNotifier;

/// 结果处理器
///
/// 消费每个任务的执行结果：
/// - 非 null 成功：写 Result 行，带通知则写 Notification 行并发邮件，
///   之后把 `next_run` 推进 `interval` 分钟
/// - null 成功：既不写 Result 也不写 Notification（即使通知非空，
///   通知只随已写入的 Result 持久化），但仍然重新排期
/// - 失败：禁用任务，写 `is_error` Result 行（正文 `"Error: " + message`），
///   无条件发失败邮件，`next_run` 保持不变
///
/// 单个任务内的每次写入相互独立，某次写入失败只中止该任务
/// 剩余的写入；跨任务不需要任何事务。
pub struct OutcomeHandler {
    task_repo: Arc<dyn TaskRepository>,
    result_repo: Arc<dyn ResultRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
    user_repo: Arc<dyn UserRepository>,
    notifier: EmailNotifier,
    events: Arc<dyn EventPublisher>,
}

impl OutcomeHandler {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        result_repo: Arc<dyn ResultRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        user_repo: Arc<dyn UserRepository>,
        notifier: EmailNotifier,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            task_repo,
            result_repo,
            notification_repo,
            user_repo,
            notifier,
            events,
        }
    }

    pub async fn handle(
        &self,
        task: &Task,
        outcome: ExecutionOutcome,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        match outcome {
            ExecutionOutcome::Success {
                result,
                notification,
            } => self.handle_success(task, result, notification, now).await,
            ExecutionOutcome::Failure { message } => self.handle_failure(task, &message).await,
        }
    }

    async fn handle_success(
        &self,
        task: &Task,
        result: Option<Value>,
        notification: Option<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        match result {
            Some(value) => {
                let inserted = self
                    .result_repo
                    .insert(&TaskResult::success(
                        task.id,
                        task.user_id,
                        value.to_string(),
                    ))
                    .await?;
                self.publish(
                    task.user_id,
                    EntityKind::Result,
                    ChangeAction::Insert,
                    serde_json::to_value(&inserted)?,
                );

                if let Some(text) = notification {
                    let row = self
                        .notification_repo
                        .insert(&Notification::new(
                            task.id,
                            task.user_id,
                            inserted.id,
                            text.clone(),
                        ))
                        .await?;
                    self.publish(
                        task.user_id,
                        EntityKind::Notification,
                        ChangeAction::Insert,
                        serde_json::to_value(&row)?,
                    );
                    self.send_success_email(task, &text).await;
                }
            }
            None => {
                // null 结果按设计丢弃，通知只随已写入的 Result 持久化
                if notification.is_some() {
                    debug!("任务 {} 返回 null 结果，附带的通知一并丢弃", task.name);
                }
            }
        }

        let next_run = task.next_run_after(now);
        self.task_repo.reschedule(task.id, next_run).await?;

        let mut updated = task.clone();
        updated.next_run = next_run;
        self.publish(
            task.user_id,
            EntityKind::Task,
            ChangeAction::Update,
            serde_json::to_value(&updated)?,
        );
        Ok(())
    }

    async fn handle_failure(&self, task: &Task, message: &str) -> EngineResult<()> {
        // 先禁用，任务在外部重新启用前不会再被选中；next_run 保持不变
        self.task_repo.set_active(task.id, false).await?;

        let mut disabled = task.clone();
        disabled.active = false;
        self.publish(
            task.user_id,
            EntityKind::Task,
            ChangeAction::Update,
            serde_json::to_value(&disabled)?,
        );

        let inserted = self
            .result_repo
            .insert(&TaskResult::error(task.id, task.user_id, message))
            .await?;
        self.publish(
            task.user_id,
            EntityKind::Result,
            ChangeAction::Insert,
            serde_json::to_value(&inserted)?,
        );

        self.send_failure_email(task, message).await;
        Ok(())
    }

    async fn send_success_email(&self, task: &Task, notification: &str) {
        match self.user_repo.get_by_id(task.user_id).await {
            Ok(Some(user)) => self.notifier.notify_success(&user, task, notification).await,
            Ok(None) => warn!("任务 {} 的拥有者 {} 不存在，跳过通知邮件", task.name, task.user_id),
            Err(e) => warn!("查询任务 {} 的拥有者失败: {}", task.name, e),
        }
    }

    async fn send_failure_email(&self, task: &Task, message: &str) {
        match self.user_repo.get_by_id(task.user_id).await {
            Ok(Some(user)) => self.notifier.notify_failure(&user, task, message).await,
            Ok(None) => warn!("任务 {} 的拥有者 {} 不存在，跳过错误邮件", task.name, task.user_id),
            Err(e) => warn!("查询任务 {} 的拥有者失败: {}", task.name, e),
        }
    }

    fn publish(&self, user_id: Uuid, kind: EntityKind, action: ChangeAction, payload: Value) {
        self.events
            .publish(ChangeEvent::new(user_id, kind, action, payload));
    }
}
