//! Test data builders for creating test entities
//!
//! This module provides builder patterns for creating test data with
//! sensible defaults and easy customization.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use robosched_core::models::{Collection, Notification, Task, TaskResult, User};

/// Builder for creating test Task entities
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            task: Task {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                collection_id: Uuid::new_v4(),
                name: "test_task".to_string(),
                description: String::new(),
                code: "return { result: null, notification: null }".to_string(),
                interval: 60,
                active: true,
                next_run: now - Duration::minutes(1),
                created_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.task.id = id;
        self
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.task.user_id = user_id;
        self
    }

    pub fn with_collection(mut self, collection_id: Uuid) -> Self {
        self.task.collection_id = collection_id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.task.name = name.to_string();
        self
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.task.code = code.to_string();
        self
    }

    pub fn with_interval(mut self, minutes: i64) -> Self {
        self.task.interval = minutes;
        self
    }

    pub fn with_next_run(mut self, next_run: DateTime<Utc>) -> Self {
        self.task.next_run = next_run;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.task.active = false;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test User entities
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    pub fn new() -> Self {
        Self {
            user: User {
                id: Uuid::new_v4(),
                email: "owner@example.com".to_string(),
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.user.id = id;
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.user.email = email.to_string();
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}

impl Default for UserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Collection entities
pub struct CollectionBuilder {
    collection: Collection,
}

impl CollectionBuilder {
    pub fn new() -> Self {
        Self {
            collection: Collection {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                name: "test_collection".to_string(),
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.collection.id = id;
        self
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.collection.user_id = user_id;
        self
    }

    pub fn build(self) -> Collection {
        self.collection
    }
}

impl Default for CollectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience constructors for results and notifications
pub fn success_result(task: &Task, value: &serde_json::Value) -> TaskResult {
    TaskResult::success(task.id, task.user_id, value.to_string())
}

pub fn unread_notification(task: &Task, result_id: Uuid, text: &str) -> Notification {
    Notification::new(task.id, task.user_id, result_id, text.to_string())
}
