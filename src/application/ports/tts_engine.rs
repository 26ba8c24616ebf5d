//! TTS Engine Port - 上游合成引擎抽象
//!
//! 定义单片段合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use super::token_provider::SessionToken;
use crate::domain::{TextChunk, VoiceParams};

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TtsError {
    /// 上游拒绝了令牌（401/403），令牌应当作废
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TtsError::Upstream { status, .. } if *status == 401 || *status == 403)
    }
}

/// 单个片段的合成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    /// 对应的片段序号
    pub index: usize,
    /// 上游返回的原始音频字节（不透明）
    pub data: Bytes,
}

impl AudioSegment {
    pub fn new(index: usize, data: impl Into<Bytes>) -> Self {
        Self {
            index,
            data: data.into(),
        }
    }
}

/// TTS Engine Port
///
/// 单次调用只合成一个片段，不做重试
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成一个片段
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceParams,
        token: &SessionToken,
    ) -> Result<AudioSegment, TtsError>;
}
