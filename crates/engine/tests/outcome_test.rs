#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use robosched_core::models::{ChangeAction, EntityKind, ExecutionOutcome};
    use robosched_core::traits::TaskRepository;
    use robosched_engine::{EmailNotifier, OutcomeHandler};
    use robosched_testing_utils::{
        CollectingPublisher, MockMailer, MockNotificationRepository, MockResultRepository,
        MockTaskRepository, MockUserRepository, TaskBuilder, UserBuilder,
    };

    struct Fixture {
        task_repo: MockTaskRepository,
        result_repo: MockResultRepository,
        notification_repo: MockNotificationRepository,
        mailer: Arc<MockMailer>,
        events: CollectingPublisher,
        handler: OutcomeHandler,
        user_id: Uuid,
    }

    fn fixture() -> Fixture {
        let user = UserBuilder::new().with_email("owner@example.com").build();
        let user_id = user.id;
        let task_repo = MockTaskRepository::new();
        let result_repo = MockResultRepository::new();
        let notification_repo = MockNotificationRepository::new();
        let user_repo = MockUserRepository::with_users(vec![user]);
        let mailer = Arc::new(MockMailer::new());
        let events = CollectingPublisher::new();

        let handler = OutcomeHandler::new(
            Arc::new(task_repo.clone()),
            Arc::new(result_repo.clone()),
            Arc::new(notification_repo.clone()),
            Arc::new(user_repo),
            EmailNotifier::new(mailer.clone()),
            Arc::new(events.clone()),
        );

        Fixture {
            task_repo,
            result_repo,
            notification_repo,
            mailer,
            events,
            handler,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_success_without_notification_writes_result_only() {
        let f = fixture();
        let now = Utc::now();
        let task = TaskBuilder::new()
            .with_user(f.user_id)
            .with_interval(60)
            .with_next_run(now - Duration::minutes(1))
            .build();
        f.task_repo.create(&task).await.unwrap();

        let outcome = ExecutionOutcome::Success {
            result: Some(json!(5)),
            notification: None,
        };
        f.handler.handle(&task, outcome, now).await.unwrap();

        let results = f.result_repo.all();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result, "5");
        assert!(!results[0].is_error);
        assert_eq!(f.notification_repo.count(), 0);
        assert_eq!(f.mailer.count(), 0);

        let updated = f.task_repo.get(task.id).unwrap();
        assert!(updated.active);
        assert_eq!(updated.next_run, now + Duration::minutes(60));
    }

    #[tokio::test]
    async fn test_success_with_notification_writes_both_and_sends_email() {
        let f = fixture();
        let now = Utc::now();
        let task = TaskBuilder::new().with_user(f.user_id).build();
        f.task_repo.create(&task).await.unwrap();

        let outcome = ExecutionOutcome::Success {
            result: Some(json!({"price": 99})),
            notification: Some("price dropped".to_string()),
        };
        f.handler.handle(&task, outcome, now).await.unwrap();

        let results = f.result_repo.all();
        let notifications = f.notification_repo.all();
        assert_eq!(results.len(), 1);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].result_id, results[0].id);
        assert_eq!(notifications[0].notification, "price dropped");
        assert!(!notifications[0].is_read);

        let sent = f.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].subject, format!("{} notification", task.name));
        assert!(sent[0].html.contains("price dropped"));
    }

    #[tokio::test]
    async fn test_null_result_discards_notification_too() {
        // 文档化的边界行为：null 结果时连同非空通知一起丢弃，
        // 任务仍然重新排期
        let f = fixture();
        let now = Utc::now();
        let task = TaskBuilder::new()
            .with_user(f.user_id)
            .with_interval(30)
            .build();
        f.task_repo.create(&task).await.unwrap();

        let outcome = ExecutionOutcome::Success {
            result: None,
            notification: Some("Alert".to_string()),
        };
        f.handler.handle(&task, outcome, now).await.unwrap();

        assert_eq!(f.result_repo.count(), 0);
        assert_eq!(f.notification_repo.count(), 0);
        assert_eq!(f.mailer.count(), 0);

        let updated = f.task_repo.get(task.id).unwrap();
        assert!(updated.active);
        assert_eq!(updated.next_run, now + Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_failure_disables_task_and_records_error() {
        let f = fixture();
        let now = Utc::now();
        let task = TaskBuilder::new().with_user(f.user_id).build();
        let original_next_run = task.next_run;
        f.task_repo.create(&task).await.unwrap();

        let outcome = ExecutionOutcome::failure("boom");
        f.handler.handle(&task, outcome, now).await.unwrap();

        let updated = f.task_repo.get(task.id).unwrap();
        assert!(!updated.active);
        assert_eq!(updated.next_run, original_next_run);

        let results = f.result_repo.all();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_error);
        assert_eq!(results[0].result, "Error: boom");

        let sent = f.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, format!("Error in task {}", task.name));
        assert!(sent[0].html.contains("boom"));
    }

    #[tokio::test]
    async fn test_success_publishes_result_and_task_events() {
        let f = fixture();
        let task = TaskBuilder::new().with_user(f.user_id).build();
        f.task_repo.create(&task).await.unwrap();

        let outcome = ExecutionOutcome::Success {
            result: Some(json!(1)),
            notification: Some("hi".to_string()),
        };
        f.handler.handle(&task, outcome, Utc::now()).await.unwrap();

        let events = f.events.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EntityKind::Result);
        assert_eq!(events[0].action, ChangeAction::Insert);
        assert_eq!(events[1].kind, EntityKind::Notification);
        assert_eq!(events[1].action, ChangeAction::Insert);
        assert_eq!(events[2].kind, EntityKind::Task);
        assert_eq!(events[2].action, ChangeAction::Update);
        assert!(events.iter().all(|e| e.user_id == f.user_id));
    }

    #[tokio::test]
    async fn test_failure_publishes_disable_before_error_result() {
        let f = fixture();
        let task = TaskBuilder::new().with_user(f.user_id).build();
        f.task_repo.create(&task).await.unwrap();

        f.handler
            .handle(&task, ExecutionOutcome::failure("boom"), Utc::now())
            .await
            .unwrap();

        let events = f.events.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EntityKind::Task);
        assert_eq!(events[0].payload["active"], false);
        assert_eq!(events[1].kind, EntityKind::Result);
        assert_eq!(events[1].action, ChangeAction::Insert);
    }

    #[tokio::test]
    async fn test_mailer_failure_does_not_fail_outcome() {
        let f = fixture();
        f.mailer.fail_sends();
        let task = TaskBuilder::new().with_user(f.user_id).build();
        f.task_repo.create(&task).await.unwrap();

        let outcome = ExecutionOutcome::failure("boom");
        f.handler.handle(&task, outcome, Utc::now()).await.unwrap();

        // 邮件失败不回写任务/结果状态
        assert!(!f.task_repo.get(task.id).unwrap().active);
        assert_eq!(f.result_repo.count(), 1);
    }

    #[tokio::test]
    async fn test_store_error_aborts_remaining_writes() {
        let f = fixture();
        f.result_repo.fail_on_insert();
        let now = Utc::now();
        let task = TaskBuilder::new().with_user(f.user_id).build();
        let original_next_run = task.next_run;
        f.task_repo.create(&task).await.unwrap();

        let outcome = ExecutionOutcome::Success {
            result: Some(json!(5)),
            notification: None,
        };
        let handled = f.handler.handle(&task, outcome, now).await;
        assert!(handled.is_err());

        // next_run 未推进，任务会在下个周期被重新评估
        let updated = f.task_repo.get(task.id).unwrap();
        assert_eq!(updated.next_run, original_next_run);
        assert!(updated.active);
    }
}
