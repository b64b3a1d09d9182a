use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use robosched_core::errors::{EngineError, EngineResult};
use robosched_core::models::{Collection, Notification, Task, TaskResult, User};

/// 一次全量重同步拉回的数据
#[derive(Debug, Clone, Default)]
pub struct ResyncSnapshot {
    pub user: Option<User>,
    pub collections: Vec<Collection>,
    pub tasks: Vec<Task>,
    pub results: Vec<TaskResult>,
    pub notifications: Vec<Notification>,
}

/// 全量数据加载能力，重连后用它覆盖本地镜像
#[async_trait]
pub trait DataLoader: Send + Sync {
    async fn load_all(&self) -> EngineResult<ResyncSnapshot>;
}

/// 走 REST 端点的全量加载实现
pub struct HttpDataLoader {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpDataLoader {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| EngineError::connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let name = body
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or_default();
            return Err(match (status.as_u16(), name) {
                (_, "InvalidAuthTokenError") | (401, _) | (403, _) => {
                    EngineError::InvalidToken(format!("{path} 返回 {status}"))
                }
                (_, "ValidationError") => {
                    EngineError::contract_violation(format!("{path} 返回 {status}"))
                }
                _ => EngineError::connection(format!("{path} 返回 {status}")),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| EngineError::connection(e.to_string()))
    }
}

#[async_trait]
impl DataLoader for HttpDataLoader {
    async fn load_all(&self) -> EngineResult<ResyncSnapshot> {
        let user = self.fetch("/user").await?;
        let collections: Vec<Collection> = self.fetch("/collections").await?;
        let tasks: Vec<Task> = self.fetch("/tasks").await?;
        let results = self.fetch("/results").await?;
        let notifications = self.fetch("/notifications").await?;
        debug!(
            "全量重同步完成: {} 个分组 / {} 个任务",
            collections.len(),
            tasks.len()
        );
        Ok(ResyncSnapshot {
            user: Some(user),
            collections,
            tasks,
            results,
            notifications,
        })
    }
}
