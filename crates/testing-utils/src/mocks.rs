//! Mock implementations for all repository and capability traits
//!
//! This module provides in-memory mock implementations that can be used
//! for unit testing without requiring an actual database connection or
//! external services.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use robosched_core::models::{ChangeEvent, EntityKind, Notification, Task, TaskResult, User};
use robosched_core::traits::{
    CodeRunner, EventPublisher, Mailer, NotificationRepository, ResultRepository, TaskRepository,
    TokenValidator, UserRepository,
};
use robosched_core::{EngineError, EngineResult};

/// Mock implementation of TaskRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockTaskRepository {
    tasks: Arc<Mutex<HashMap<Uuid, Task>>>,
}

impl MockTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let map = tasks.into_iter().map(|t| (t.id, t)).collect();
        Self {
            tasks: Arc::new(Mutex::new(map)),
        }
    }

    /// Synchronous accessor for assertions
    pub fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn find_due(&self, now: DateTime<Utc>) -> EngineResult<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap();
        let mut due: Vec<Task> = tasks.values().filter(|t| t.is_due(now)).cloned().collect();
        due.sort_by_key(|t| t.next_run);
        Ok(due)
    }

    async fn reschedule(&self, id: Uuid, next_run: DateTime<Utc>) -> EngineResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(&id)
            .ok_or(EngineError::TaskNotFound { id })?;
        task.next_run = next_run;
        Ok(())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> EngineResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(&id)
            .ok_or(EngineError::TaskNotFound { id })?;
        task.active = active;
        Ok(())
    }

    async fn create(&self, task: &Task) -> EngineResult<Task> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }
}

/// Mock implementation of ResultRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockResultRepository {
    results: Arc<Mutex<Vec<TaskResult>>>,
    fail_on_insert: Arc<Mutex<bool>>,
}

impl MockResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail with a store error
    pub fn fail_on_insert(&self) {
        *self.fail_on_insert.lock().unwrap() = true;
    }

    pub fn all(&self) -> Vec<TaskResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}

#[async_trait]
impl ResultRepository for MockResultRepository {
    async fn insert(&self, result: &TaskResult) -> EngineResult<TaskResult> {
        if *self.fail_on_insert.lock().unwrap() {
            return Err(EngineError::store("mock insert failure"));
        }
        self.results.lock().unwrap().push(result.clone());
        Ok(result.clone())
    }

    async fn latest_success(&self, task_id: Uuid) -> EngineResult<Option<TaskResult>> {
        let results = self.results.lock().unwrap();
        Ok(results
            .iter()
            .rev()
            .find(|r| r.task_id == task_id && !r.is_error)
            .cloned())
    }
}

/// Mock implementation of NotificationRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockNotificationRepository {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn insert(&self, notification: &Notification) -> EngineResult<Notification> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(notification.clone())
    }
}

/// Mock implementation of UserRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MockUserRepository {
    pub fn with_users(users: Vec<User>) -> Self {
        let map = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Arc::new(Mutex::new(map)),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn get_by_id(&self, id: Uuid) -> EngineResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

/// A single recorded invocation of the mock code runner
#[derive(Debug, Clone)]
pub struct RunnerCall {
    pub code: String,
    pub prev_result: Option<Value>,
}

/// Mock implementation of the opaque code-execution capability
///
/// Responses can be scripted per code string (`with_script`) or queued
/// globally (`push_response`/`push_error`). Every call is recorded so tests
/// can assert on the `prevResult` that was passed.
#[derive(Default)]
pub struct MockCodeRunner {
    scripts: Mutex<HashMap<String, Result<Value, String>>>,
    queue: Mutex<VecDeque<Result<Value, String>>>,
    calls: Mutex<Vec<RunnerCall>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockCodeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, code: &str, response: Result<Value, String>) -> Self {
        self.scripts.lock().unwrap().insert(code.to_string(), response);
        self
    }

    pub fn push_response(&self, payload: Value) {
        self.queue.lock().unwrap().push_back(Ok(payload));
    }

    pub fn push_error(&self, message: &str) {
        self.queue.lock().unwrap().push_back(Err(message.to_string()));
    }

    /// Make each run take at least `delay`, for concurrency assertions
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of concurrently in-flight runs observed
    pub fn max_observed_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeRunner for MockCodeRunner {
    async fn run(&self, code: &str, prev_result: Option<&Value>) -> EngineResult<Value> {
        self.calls.lock().unwrap().push(RunnerCall {
            code: code.to_string(),
            prev_result: prev_result.cloned(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.scripts.lock().unwrap().get(code).cloned();
        let response = match scripted {
            Some(response) => response,
            None => self
                .queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("no scripted response".to_string())),
        };

        response.map_err(EngineError::invocation)
    }
}

/// A single email recorded by the mock mailer
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mock implementation of the Mailer capability
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: Mutex<bool>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> EngineResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(EngineError::Mailer("mock send failure".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

/// Event publisher that records every published event
#[derive(Debug, Clone, Default)]
pub struct CollectingPublisher {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl CollectingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn of_kind(&self, kind: EntityKind) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

impl EventPublisher for CollectingPublisher {
    fn publish(&self, event: ChangeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Token validator backed by a static token-to-user map
#[derive(Debug, Clone, Default)]
pub struct MockTokenValidator {
    tokens: Arc<Mutex<HashMap<String, Uuid>>>,
}

impl MockTokenValidator {
    pub fn with_token(token: &str, user_id: Uuid) -> Self {
        let validator = Self::default();
        validator
            .tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), user_id);
        validator
    }

    pub fn add_token(&self, token: &str, user_id: Uuid) {
        self.tokens.lock().unwrap().insert(token.to_string(), user_id);
    }
}

#[async_trait]
impl TokenValidator for MockTokenValidator {
    async fn validate(&self, token: &str) -> EngineResult<Uuid> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .copied()
            .ok_or_else(|| EngineError::InvalidToken("unknown session token".to_string()))
    }
}
