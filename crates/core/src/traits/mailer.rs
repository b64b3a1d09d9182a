use async_trait::async_trait;

use crate::EngineResult;

/// 邮件发送能力
///
/// 发送失败不会回写任务/结果状态，调用方按尽力而为处理。
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> EngineResult<()>;
}
