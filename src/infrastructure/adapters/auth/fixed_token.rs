//! Fixed Token Provider - 用于测试的令牌提供者
//!
//! 始终返回同一个令牌（或同一个错误），并记录调用次数

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::{SessionToken, TokenError, TokenProviderPort};

pub struct FixedTokenProvider {
    token: Option<SessionToken>,
    get_calls: AtomicUsize,
    invalidations: AtomicUsize,
}

impl FixedTokenProvider {
    pub fn new(token: SessionToken) -> Self {
        Self {
            token: Some(token),
            get_calls: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
        }
    }

    /// 一小时后过期的 eastus 令牌
    pub fn valid() -> Self {
        Self::new(SessionToken::new(
            "eastus",
            "fixed-token",
            Utc::now().timestamp() + 3600,
        ))
    }

    /// 每次都返回获取失败
    pub fn failing() -> Self {
        Self {
            token: None,
            get_calls: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
        }
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProviderPort for FixedTokenProvider {
    async fn get_token(&self) -> Result<SessionToken, TokenError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.token.clone().ok_or_else(|| TokenError::Acquisition {
            attempts: 1,
            reason: "token endpoint unavailable".to_string(),
        })
    }

    async fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}
