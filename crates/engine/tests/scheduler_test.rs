#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::{Duration, Utc};
    use serde_json::json;

    use robosched_core::traits::{ResultRepository, TaskRepository};
    use robosched_engine::{CycleEngine, EmailNotifier, ExecutionInvoker, OutcomeHandler};
    use robosched_testing_utils::{
        CollectingPublisher, MockCodeRunner, MockMailer, MockNotificationRepository,
        MockResultRepository, MockTaskRepository, MockUserRepository, TaskBuilder, UserBuilder,
    };

    struct Fixture {
        task_repo: MockTaskRepository,
        result_repo: MockResultRepository,
        runner: Arc<MockCodeRunner>,
        mailer: Arc<MockMailer>,
        engine: CycleEngine,
        user_id: uuid::Uuid,
    }

    fn fixture_with(runner: MockCodeRunner, max_concurrent_runs: Option<usize>) -> Fixture {
        let user = UserBuilder::new().build();
        let user_id = user.id;
        let task_repo = MockTaskRepository::new();
        let result_repo = MockResultRepository::new();
        let notification_repo = MockNotificationRepository::new();
        let user_repo = MockUserRepository::with_users(vec![user]);
        let mailer = Arc::new(MockMailer::new());
        let runner = Arc::new(runner);

        let invoker = Arc::new(ExecutionInvoker::new(
            runner.clone(),
            StdDuration::from_secs(5),
        ));
        let outcomes = Arc::new(OutcomeHandler::new(
            Arc::new(task_repo.clone()),
            Arc::new(result_repo.clone()),
            Arc::new(notification_repo),
            Arc::new(user_repo),
            EmailNotifier::new(mailer.clone()),
            Arc::new(CollectingPublisher::new()),
        ));
        let engine = CycleEngine::new(
            Arc::new(task_repo.clone()),
            Arc::new(result_repo.clone()),
            invoker,
            outcomes,
            max_concurrent_runs,
        );

        Fixture {
            task_repo,
            result_repo,
            runner,
            mailer,
            engine,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_only_due_tasks_are_executed() {
        let runner = MockCodeRunner::new()
            .with_script("due", Ok(json!({"result": 1, "notification": null})));
        let f = fixture_with(runner, None);
        let now = Utc::now();

        let due = TaskBuilder::new()
            .with_name("due")
            .with_code("due")
            .with_next_run(now - Duration::minutes(1))
            .build();
        let not_yet = TaskBuilder::new()
            .with_code("later")
            .with_next_run(now + Duration::minutes(10))
            .build();
        let disabled = TaskBuilder::new()
            .with_code("off")
            .with_next_run(now - Duration::minutes(1))
            .inactive()
            .build();
        for task in [&due, &not_yet, &disabled] {
            f.task_repo.create(task).await.unwrap();
        }

        let summary = f.engine.run_cycle().await.unwrap();
        assert_eq!(summary.due, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);

        let calls = f.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].code, "due");
    }

    #[tokio::test]
    async fn test_one_failing_task_does_not_block_others() {
        let runner = MockCodeRunner::new()
            .with_script("ok", Ok(json!({"result": 1, "notification": null})))
            .with_script("bad", Err("boom".to_string()));
        let f = fixture_with(runner, None);
        let now = Utc::now();

        let good = TaskBuilder::new()
            .with_user(f.user_id)
            .with_code("ok")
            .with_next_run(now - Duration::minutes(2))
            .build();
        let bad = TaskBuilder::new()
            .with_user(f.user_id)
            .with_code("bad")
            .with_next_run(now - Duration::minutes(1))
            .build();
        f.task_repo.create(&good).await.unwrap();
        f.task_repo.create(&bad).await.unwrap();

        let summary = f.engine.run_cycle().await.unwrap();
        assert_eq!(summary.due, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);

        // 好的任务照常推进，坏的被禁用并留下错误结果
        assert!(f.task_repo.get(good.id).unwrap().active);
        assert!(f.task_repo.get(good.id).unwrap().next_run > now);
        assert!(!f.task_repo.get(bad.id).unwrap().active);

        let bad_results = f.result_repo.all();
        let error_rows: Vec<_> = bad_results.iter().filter(|r| r.is_error).collect();
        assert_eq!(error_rows.len(), 1);
        assert_eq!(error_rows[0].result, "Error: boom");
        assert_eq!(f.mailer.count(), 1);
    }

    #[tokio::test]
    async fn test_success_reschedules_by_interval() {
        let runner = MockCodeRunner::new();
        runner.push_response(json!({"result": 5, "notification": null}));
        let f = fixture_with(runner, None);

        let before = Utc::now();
        let task = TaskBuilder::new()
            .with_interval(60)
            .with_next_run(before - Duration::minutes(1))
            .build();
        f.task_repo.create(&task).await.unwrap();

        f.engine.run_cycle().await.unwrap();
        let after = Utc::now();

        let updated = f.task_repo.get(task.id).unwrap();
        assert!(updated.active);
        assert!(updated.next_run >= before + Duration::minutes(60));
        assert!(updated.next_run <= after + Duration::minutes(60));

        let results = f.result_repo.all();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result, "5");
        assert!(!results[0].is_error);
    }

    #[tokio::test]
    async fn test_oversized_result_disables_task() {
        let runner = MockCodeRunner::new();
        runner.push_response(json!({"result": "x".repeat(3000), "notification": null}));
        let f = fixture_with(runner, None);

        let task = TaskBuilder::new().build();
        f.task_repo.create(&task).await.unwrap();

        let summary = f.engine.run_cycle().await.unwrap();
        assert_eq!(summary.failed, 1);

        assert!(!f.task_repo.get(task.id).unwrap().active);
        let results = f.result_repo.all();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_error);
        assert_eq!(results[0].result, "Error: result value too large");
    }

    #[tokio::test]
    async fn test_latest_success_is_passed_as_prev_result() {
        let runner = MockCodeRunner::new();
        runner.push_response(json!({"result": 2, "notification": null}));
        let f = fixture_with(runner, None);

        let task = TaskBuilder::new().build();
        f.task_repo.create(&task).await.unwrap();
        f.result_repo
            .insert(&robosched_core::models::TaskResult::success(
                task.id,
                task.user_id,
                "{\"count\":1}".to_string(),
            ))
            .await
            .unwrap();

        f.engine.run_cycle().await.unwrap();

        let calls = f.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prev_result, Some(json!({"count": 1})));
    }

    #[tokio::test]
    async fn test_error_results_are_not_used_as_prev_result() {
        let runner = MockCodeRunner::new();
        runner.push_response(json!({"result": 2, "notification": null}));
        let f = fixture_with(runner, None);

        let task = TaskBuilder::new().build();
        f.task_repo.create(&task).await.unwrap();
        f.result_repo
            .insert(&robosched_core::models::TaskResult::error(
                task.id,
                task.user_id,
                "boom",
            ))
            .await
            .unwrap();

        f.engine.run_cycle().await.unwrap();

        let calls = f.runner.calls();
        assert_eq!(calls[0].prev_result, None);
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let runner = MockCodeRunner::new();
        runner.set_delay(StdDuration::from_millis(50));
        for _ in 0..6 {
            runner.push_response(json!({"result": 1, "notification": null}));
        }
        let f = fixture_with(runner, Some(2));

        let now = Utc::now();
        for i in 0..6 {
            let task = TaskBuilder::new()
                .with_next_run(now - Duration::minutes(i + 1))
                .build();
            f.task_repo.create(&task).await.unwrap();
        }

        let summary = f.engine.run_cycle().await.unwrap();
        assert_eq!(summary.due, 6);
        assert_eq!(summary.succeeded, 6);
        assert!(f.runner.max_observed_concurrency() <= 2);
    }

    #[tokio::test]
    async fn test_unbounded_cycle_runs_tasks_concurrently() {
        let runner = MockCodeRunner::new();
        runner.set_delay(StdDuration::from_millis(50));
        for _ in 0..4 {
            runner.push_response(json!({"result": 1, "notification": null}));
        }
        let f = fixture_with(runner, None);

        let now = Utc::now();
        for i in 0..4 {
            let task = TaskBuilder::new()
                .with_next_run(now - Duration::minutes(i + 1))
                .build();
            f.task_repo.create(&task).await.unwrap();
        }

        f.engine.run_cycle().await.unwrap();
        assert_eq!(f.runner.max_observed_concurrency(), 4);
    }
}
