//! 握手请求签名
//!
//! 签名格式：`{app_id}::{base64(hmac)}::{date}::{trace_id}`，
//! hmac 为 HMAC-SHA256(key, lower("{app_id}{urlencode(url 去掉协议)}{date}{trace_id}"))

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::application::ports::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// 请求签名器
#[derive(Clone)]
pub struct RequestSigner {
    app_id: String,
    mac: HmacSha256,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// `signing_key` 为 base64 编码的预共享密钥
    pub fn new(app_id: impl Into<String>, signing_key: &str) -> Result<Self, TokenError> {
        let key = STANDARD
            .decode(signing_key.trim())
            .map_err(|e| TokenError::Configuration(format!("signing key is not base64: {}", e)))?;
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| TokenError::Configuration(e.to_string()))?;

        Ok(Self {
            app_id: app_id.into(),
            mac,
        })
    }

    /// 生成 X-MT-Signature 头
    pub fn sign(&self, url: &str, date: &str, trace_id: &str) -> String {
        let target = url.split_once("://").map_or(url, |(_, rest)| rest);
        let payload = format!(
            "{}{}{}{}",
            self.app_id,
            encode_component(target),
            date,
            trace_id
        )
        .to_lowercase();

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        format!("{}::{}::{}::{}", self.app_id, signature, date, trace_id)
    }
}

/// URL 组件编码
fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// 小写的 RFC-1123 时间戳，如 `tue, 02 jan 2024 03:04:05 gmt`
pub fn signature_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
        .to_lowercase()
}

/// 每次请求新生成的追踪 ID（32 位十六进制）
pub fn new_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 由部署主机名派生的客户端安装 ID
///
/// 同一主机名稳定不变，不同部署之间互不冲突
pub fn client_user_id(hostname: &str) -> String {
    let digest = format!("{:x}", md5::compute(hostname.trim().to_lowercase().as_bytes()));
    digest[..16].to_string()
}
