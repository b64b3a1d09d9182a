use robosched_core::errors::EngineError;

/// API/重同步失败的统一归类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 网络不可达或对端异常，可重试
    Network,
    /// 请求数据不合法，重试无意义
    Validation,
    /// 会话令牌失效，需要整体重置会话
    SessionExpired,
    Unknown,
}

/// 所有调用点共用的归类入口，禁止在调用处各自分支
pub fn classify(error: &EngineError) -> FailureKind {
    match error {
        EngineError::Connection(_) => FailureKind::Network,
        EngineError::InvalidToken(_) => FailureKind::SessionExpired,
        EngineError::ContractViolation(_) => FailureKind::Validation,
        _ => FailureKind::Unknown,
    }
}
