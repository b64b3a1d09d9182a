use async_trait::async_trait;
use tracing::debug;

use robosched_core::config::MailerConfig;
use robosched_core::traits::Mailer;
use robosched_core::{EngineError, EngineResult};

/// SparkPost 传输接口的邮件实现
pub struct SparkpostMailer {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    sender: String,
}

impl SparkpostMailer {
    pub fn new(config: &MailerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            sender: config.sender.clone(),
        }
    }
}

#[async_trait]
impl Mailer for SparkpostMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> EngineResult<()> {
        let body = serde_json::json!({
            "options": { "inline_css": true },
            "content": {
                "from": self.sender,
                "subject": subject,
                "html": html,
            },
            "recipients": [ { "address": to } ],
        });

        let response = self
            .http
            .post(format!("{}/transmissions", self.api_base))
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Mailer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Mailer(format!(
                "SparkPost 返回 {status}: {text}"
            )));
        }

        debug!("通知邮件已提交发送: {}", subject);
        Ok(())
    }
}
