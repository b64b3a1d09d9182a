use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use robosched_core::config::AuthConfig;
use robosched_core::traits::TokenValidator;
use robosched_core::{EngineError, EngineResult};

/// 调用外部认证服务换取用户 id
pub struct HttpTokenValidator {
    http: reqwest::Client,
    verify_url: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: Uuid,
}

impl HttpTokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            verify_url: config.verify_url.clone(),
        }
    }
}

#[async_trait]
impl TokenValidator for HttpTokenValidator {
    async fn validate(&self, token: &str) -> EngineResult<Uuid> {
        let response = self
            .http
            .get(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| EngineError::connection(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(EngineError::InvalidToken(format!("认证服务返回 {status}")));
        }
        if !status.is_success() {
            return Err(EngineError::connection(format!("认证服务返回 {status}")));
        }

        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|e| EngineError::connection(e.to_string()))?;
        Ok(verified.user_id)
    }
}
