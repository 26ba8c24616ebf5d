//! Token Provider Port - 会话令牌抽象
//!
//! 上游合成调用需要短期有效的 bearer 令牌和区域端点

use async_trait::async_trait;
use thiserror::Error;

/// 令牌获取错误
#[derive(Debug, Error)]
pub enum TokenError {
    /// 所有重试均失败，且没有可降级使用的缓存令牌
    #[error("Token acquisition failed after {attempts} attempts: {reason}")]
    Acquisition { attempts: u32, reason: String },

    #[error("Invalid token configuration: {0}")]
    Configuration(String),
}

/// 会话令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// 区域代码，如 southeastasia
    pub region: String,
    /// bearer 字符串（JWT）
    pub bearer: String,
    /// 过期时间（Unix 秒）
    pub expires_at: i64,
}

impl SessionToken {
    pub fn new(region: impl Into<String>, bearer: impl Into<String>, expires_at: i64) -> Self {
        Self {
            region: region.into(),
            bearer: bearer.into(),
            expires_at,
        }
    }

    /// `now < expires_at - margin` 时仍可直接复用
    pub fn is_fresh(&self, now: i64, refresh_margin_secs: i64) -> bool {
        now < self.expires_at - refresh_margin_secs
    }

    /// 剩余有效秒数（已过期为负）
    pub fn seconds_left(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}

/// Token Provider Port
#[async_trait]
pub trait TokenProviderPort: Send + Sync {
    /// 获取可用令牌，必要时刷新
    async fn get_token(&self) -> Result<SessionToken, TokenError>;

    /// 作废缓存的令牌，下次调用强制刷新
    async fn invalidate(&self);
}
