use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("存储操作错误: {0}")]
    Store(String),
    #[error("任务未找到: {id}")]
    TaskNotFound { id: Uuid },
    #[error("执行契约违规: {0}")]
    ContractViolation(String),
    #[error("代码执行调用错误: {0}")]
    Invocation(String),
    #[error("代码执行超时: {0}秒")]
    ExecutionTimeout(u64),
    #[error("邮件发送错误: {0}")]
    Mailer(String),
    #[error("连接错误: {0}")]
    Connection(String),
    #[error("认证失败: {0}")]
    InvalidToken(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }
    pub fn contract_violation<S: Into<String>>(msg: S) -> Self {
        Self::ContractViolation(msg.into())
    }
    pub fn invocation<S: Into<String>>(msg: S) -> Self {
        Self::Invocation(msg.into())
    }
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// 持久化到 Result 行的错误正文（不含中文分类前缀）
    pub fn failure_message(&self) -> String {
        match self {
            EngineError::ContractViolation(msg) | EngineError::Invocation(msg) => msg.clone(),
            EngineError::ExecutionTimeout(secs) => {
                format!("execution timed out after {secs} seconds")
            }
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Internal(err.to_string())
    }
}
