use serde_json::Value;

/// 单次执行的临时结果
///
/// 由 Invoker 在每次调用时新建，随即被 Outcome Handler 消费，
/// 从不持久化为独立实体。
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// 契约校验通过。`result` 为 `None` 表示脚本返回了 null，
    /// 该结果会被丢弃（连同通知一起）。
    Success {
        result: Option<Value>,
        notification: Option<String>,
    },
    /// 调用抛错、超时或违反执行契约
    Failure { message: String },
}

impl ExecutionOutcome {
    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}
