use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use robosched_core::models::{ExecutionOutcome, Task};
use robosched_core::traits::CodeRunner;
use robosched_core::MAX_VALUE_LENGTH;

/// 执行调用器
///
/// 调用不透明的代码执行能力并在边界上强制执行契约：
/// - 响应必须包含 `result` 键（缺失即违规）
/// - `notification` 必须是 null 或字符串
/// - `result` 与 `notification` 序列化后均不得超过 2048 字符
///
/// 调用抛错、超时或违反契约统一产出 `Failure`。本层不做任何重试，
/// 重试策略属于上层（当前为无）。
pub struct ExecutionInvoker {
    runner: Arc<dyn CodeRunner>,
    timeout: Duration,
}

impl ExecutionInvoker {
    pub fn new(runner: Arc<dyn CodeRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    pub async fn invoke(&self, task: &Task, prev_result: Option<&Value>) -> ExecutionOutcome {
        let run = self.runner.run(&task.code, prev_result);
        let payload = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(e)) => return ExecutionOutcome::failure(e.failure_message()),
            Err(_) => {
                return ExecutionOutcome::failure(format!(
                    "execution timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            }
        };

        debug!("任务 {} 的执行响应已返回，开始契约校验", task.name);
        validate_payload(payload)
    }
}

/// 对原始响应负载做契约校验，产出执行结果
fn validate_payload(payload: Value) -> ExecutionOutcome {
    let result = match payload.get("result") {
        Some(value) => value.clone(),
        None => return ExecutionOutcome::failure("result cannot be undefined"),
    };

    // 缺失的 notification 键与其他非法类型同样视为违规
    let notification = match payload.get("notification") {
        Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        _ => return ExecutionOutcome::failure("notification must be a string or null"),
    };

    if serialized_len(&result) > MAX_VALUE_LENGTH {
        return ExecutionOutcome::failure("result value too large");
    }
    let notification_value = match &notification {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    };
    if serialized_len(&notification_value) > MAX_VALUE_LENGTH {
        return ExecutionOutcome::failure("notification value too large");
    }

    ExecutionOutcome::Success {
        result: if result.is_null() { None } else { Some(result) },
        notification,
    }
}

fn serialized_len(value: &Value) -> usize {
    value.to_string().len()
}
