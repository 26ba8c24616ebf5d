//! 应用层错误定义
//!
//! 合成任务的统一错误类型，所有错误都会终止整个任务

use thiserror::Error;

use super::ports::{TokenError, TtsError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 输入为空或无效，流水线尚未启动
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 令牌获取重试耗尽且无缓存可降级
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(String),

    /// 某个片段合成时上游返回非 2xx
    #[error("Upstream synthesis failed for chunk {index} (HTTP {status}): {body}")]
    UpstreamSynthesis {
        index: usize,
        status: u16,
        body: String,
    },

    /// 外部服务错误（网络、超时、响应无法读取）
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 任务被调用方取消（客户端断开）
    #[error("Synthesis cancelled")]
    Cancelled,

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建输入错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// 把单片段的 TTS 错误归入应用层错误
    pub fn from_tts(index: usize, err: TtsError) -> Self {
        match err {
            TtsError::Upstream { status, body } => Self::UpstreamSynthesis {
                index,
                status,
                body,
            },
            other => Self::ExternalServiceError(format!("chunk {}: {}", index, other)),
        }
    }
}

impl From<TokenError> for ApplicationError {
    fn from(err: TokenError) -> Self {
        Self::TokenAcquisition(err.to_string())
    }
}
