//! Session Token Manager - 会话令牌管理
//!
//! 通过签名握手换取短期 bearer 令牌与区域端点，缓存并在临近过期时刷新。
//!
//! 状态流转：
//! - 缓存有效（`now < exp - refresh_margin`）：直接返回，不访问网络
//! - 否则刷新：最多 `max_attempts` 次，线性退避 `attempt × backoff_ms`
//! - 全部失败：有旧令牌则降级返回旧令牌，否则返回 TokenError
//!
//! 缓存由内部互斥锁保护，刷新期间持有锁，并发调用合并为一次握手

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

use super::signer::{client_user_id, new_trace_id, signature_date, RequestSigner};
use crate::application::ports::{SessionToken, TokenError, TokenProviderPort};

/// 令牌管理器配置
#[derive(Debug, Clone)]
pub struct TokenManagerConfig {
    /// 握手端点
    pub token_url: String,
    /// 签名中的应用标识
    pub app_id: String,
    /// base64 编码的预共享密钥
    pub signing_key: String,
    pub user_agent: String,
    pub accept_language: String,
    pub client_version: String,
    pub home_region: String,
    /// 用于派生客户端安装 ID 的主机名
    pub hostname: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 提前刷新的余量（秒）
    pub refresh_margin_secs: i64,
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 线性退避基数（毫秒）
    pub backoff_ms: u64,
}

impl Default for TokenManagerConfig {
    fn default() -> Self {
        Self {
            token_url: "https://dev.microsofttranslator.com/apps/endpoint?api-version=1.0"
                .to_string(),
            app_id: "MSTranslatorAndroidApp".to_string(),
            signing_key: "oik6PdDdMnOXemTbwvMn9de/h9lFnfBaCWbGMMZqqoSaQaqUOqjVGm5NqsmjcBI1x+sS9ugjB55HEJWRiFXYFw==".to_string(),
            user_agent: "okhttp/4.5.0".to_string(),
            accept_language: "zh-Hans".to_string(),
            client_version: "4.0.530a 5fe1dc6c".to_string(),
            home_region: "zh-Hans-CN".to_string(),
            hostname: "localhost".to_string(),
            timeout_secs: 30,
            refresh_margin_secs: 300,
            max_attempts: 3,
            backoff_ms: 1000,
        }
    }
}

/// 握手响应体
#[derive(Debug, Deserialize)]
struct EndpointResponse {
    /// 区域
    r: String,
    /// JWT
    t: String,
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: i64,
}

/// 读取 JWT 中间段的 exp 声明
pub fn jwt_expiry(token: &str) -> Result<i64, String> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| "token is not a JWT".to_string())?;
    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| format!("JWT payload is not base64: {}", e))?;
    let claims: JwtClaims = serde_json::from_slice(&decoded)
        .map_err(|e| format!("JWT payload has no exp claim: {}", e))?;
    Ok(claims.exp)
}

/// 按线性退避重试：第 n 次失败后等待 `n × backoff_ms`，最后一次失败后不再等待
async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_ms: u64,
    mut op: F,
) -> Result<T, TokenError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let attempts = max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(attempt = attempt, max_attempts = attempts, error = %e, "Token handshake failed");
                last_error = e;
            }
        }

        if attempt < attempts {
            tokio::time::sleep(Duration::from_millis(backoff_ms * attempt as u64)).await;
        }
    }

    Err(TokenError::Acquisition {
        attempts,
        reason: last_error,
    })
}

/// 会话令牌管理器
pub struct SessionTokenManager {
    client: Client,
    config: TokenManagerConfig,
    signer: RequestSigner,
    user_id: String,
    cache: Mutex<Option<SessionToken>>,
}

impl SessionTokenManager {
    pub fn new(config: TokenManagerConfig) -> Result<Self, TokenError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TokenError::Configuration(e.to_string()))?;
        let signer = RequestSigner::new(config.app_id.clone(), &config.signing_key)?;
        let user_id = client_user_id(&config.hostname);

        tracing::info!(
            token_url = %config.token_url,
            user_id = %user_id,
            refresh_margin_secs = config.refresh_margin_secs,
            "SessionTokenManager initialized"
        );

        Ok(Self {
            client,
            config,
            signer,
            user_id,
            cache: Mutex::new(None),
        })
    }

    /// 当前缓存的令牌（不触发刷新）
    pub async fn cached(&self) -> Option<SessionToken> {
        self.cache.lock().await.clone()
    }

    async fn token_at(&self, now: i64) -> Result<SessionToken, TokenError> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref() {
            if token.is_fresh(now, self.config.refresh_margin_secs) {
                return Ok(token.clone());
            }
            tracing::debug!(
                seconds_left = token.seconds_left(now),
                "Session token near expiry, refreshing"
            );
        }

        match self.refresh_with_retry().await {
            Ok(token) => {
                *cache = Some(token.clone());
                Ok(token)
            }
            Err(e) => match cache.as_ref() {
                Some(stale) => {
                    tracing::warn!(
                        error = %e,
                        region = %stale.region,
                        seconds_left = stale.seconds_left(now),
                        "Token refresh failed, falling back to cached token"
                    );
                    Ok(stale.clone())
                }
                None => Err(e),
            },
        }
    }

    async fn refresh_with_retry(&self) -> Result<SessionToken, TokenError> {
        let token = retry_with_backoff(self.config.max_attempts, self.config.backoff_ms, |_| {
            self.acquire()
        })
        .await?;

        tracing::info!(
            region = %token.region,
            expires_at = token.expires_at,
            "Session token acquired"
        );
        Ok(token)
    }

    /// 单次签名握手
    async fn acquire(&self) -> Result<SessionToken, String> {
        let date = signature_date(Utc::now());
        let trace_id = new_trace_id();
        let signature = self.signer.sign(&self.config.token_url, &date, &trace_id);

        let response = self
            .client
            .post(&self.config.token_url)
            .header(ACCEPT_LANGUAGE, &self.config.accept_language)
            .header(USER_AGENT, &self.config.user_agent)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header("X-ClientVersion", &self.config.client_version)
            .header("X-UserId", &self.user_id)
            .header("X-HomeGeographicRegion", &self.config.home_region)
            .header("X-ClientTraceId", &trace_id)
            .header("X-MT-Signature", signature)
            .body("")
            .send()
            .await
            .map_err(|e| format!("handshake request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("handshake returned HTTP {}: {}", status, body));
        }

        let endpoint: EndpointResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid handshake response: {}", e))?;
        let expires_at = jwt_expiry(&endpoint.t)?;

        Ok(SessionToken::new(endpoint.r, endpoint.t, expires_at))
    }

    #[cfg(test)]
    async fn prime(&self, token: SessionToken) {
        *self.cache.lock().await = Some(token);
    }
}

#[async_trait]
impl TokenProviderPort for SessionTokenManager {
    async fn get_token(&self) -> Result<SessionToken, TokenError> {
        self.token_at(Utc::now().timestamp()).await
    }

    async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        if cache.take().is_some() {
            tracing::info!("Cached session token invalidated");
        }
    }
}
