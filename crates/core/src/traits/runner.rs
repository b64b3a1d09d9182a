use async_trait::async_trait;
use serde_json::Value;

use crate::EngineResult;

/// 不透明代码执行能力
///
/// 请求体为 `{ code, prevResult }`，响应为原始 JSON 负载。
/// 沙箱与安全性由执行服务自身负责；本系统只在 Invoker 边界
/// 对响应做契约校验，从不信任原始负载的形状。
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run(&self, code: &str, prev_result: Option<&Value>) -> EngineResult<Value>;
}
