use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::warn;

use robosched_core::models::{Task, User};
use robosched_core::traits::Mailer;

const EMAIL_TEMPLATE: &str = include_str!("../templates/email.html");

/// 通知邮件分发
///
/// 成功带通知的结果发一封，任意失败发一封；null 结果或 null 通知
/// 的成功不发。发送失败只记日志，从不回写任务状态。
pub struct EmailNotifier {
    mailer: Arc<dyn Mailer>,
}

impl EmailNotifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn notify_success(&self, user: &User, task: &Task, notification: &str) {
        let subject = format!("{} notification", task.name);
        let html = build_email(
            &task.name,
            &format!("<pre>{notification}</pre>"),
            notification,
        );
        self.send(user, &subject, &html).await;
    }

    pub async fn notify_failure(&self, user: &User, task: &Task, message: &str) {
        let subject = format!("Error in task {}", task.name);
        let content = format!(
            "<p>Your task encountered an error and was disabled.</p>\
             <pre class=\"error\">{message}</pre>"
        );
        let html = build_email(&task.name, &content, message);
        self.send(user, &subject, &html).await;
    }

    async fn send(&self, user: &User, subject: &str, html: &str) {
        if let Err(e) = self.mailer.send(&user.email, subject, html).await {
            warn!("发送邮件给 {} 失败: {}", user.email, e);
        }
    }
}

fn build_email(title: &str, content: &str, preheader: &str) -> String {
    EMAIL_TEMPLATE
        .replace("!!!PLACEHOLDER_TITLE!!!", title)
        .replace("!!!PLACEHOLDER_CONTENT!!!", content)
        .replace("!!!PLACEHOLDER_PREHEADER!!!", preheader)
        .replace("!!!PLACEHOLDER_YEAR!!!", &Utc::now().year().to_string())
}
