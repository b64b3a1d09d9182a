use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use robosched_core::config::RunnerConfig;
use robosched_core::traits::CodeRunner;
use robosched_core::{EngineError, EngineResult};

/// 走 HTTP 的代码执行实现
///
/// 请求体 `{ code, prevResult }`，响应原样返回，契约校验在
/// Invoker 一侧完成。超时同样由 Invoker 施加。
pub struct HttpCodeRunner {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCodeRunner {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl CodeRunner for HttpCodeRunner {
    async fn run(&self, code: &str, prev_result: Option<&Value>) -> EngineResult<Value> {
        let body = serde_json::json!({
            "code": code,
            "prevResult": prev_result,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::invocation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::invocation(format!(
                "execution service returned {status}: {text}"
            )));
        }

        debug!("代码执行服务返回 {}", status);
        response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::invocation(e.to_string()))
    }
}
