//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::application::{SchedulePolicy, DEFAULT_CONCURRENCY, DEFAULT_STREAM_BUFFER};
use crate::domain::DEFAULT_MAX_CHUNK_LEN;
use crate::infrastructure::adapters::{HttpTtsClientConfig, TokenManagerConfig};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 上游服务配置
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// 令牌刷新策略
    #[serde(default)]
    pub token: TokenConfig,

    /// 合成流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 上游服务配置
///
/// 握手与合成端点，以及模拟移动客户端所需的请求头
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// 合成端点模板，须包含 `{region}`
    #[serde(default = "default_synthesis_url")]
    pub synthesis_url: String,

    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// base64 编码的签名密钥
    #[serde(default = "default_signing_key")]
    pub signing_key: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    #[serde(default = "default_client_version")]
    pub client_version: String,

    #[serde(default = "default_home_region")]
    pub home_region: String,

    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// 派生客户端安装 ID 的主机名，未设置时读取 HOSTNAME 环境变量
    #[serde(default)]
    pub hostname: Option<String>,
}

fn default_token_url() -> String {
    TokenManagerConfig::default().token_url
}

fn default_synthesis_url() -> String {
    HttpTtsClientConfig::default().synthesis_url
}

fn default_app_id() -> String {
    TokenManagerConfig::default().app_id
}

fn default_signing_key() -> String {
    TokenManagerConfig::default().signing_key
}

fn default_user_agent() -> String {
    TokenManagerConfig::default().user_agent
}

fn default_accept_language() -> String {
    TokenManagerConfig::default().accept_language
}

fn default_client_version() -> String {
    TokenManagerConfig::default().client_version
}

fn default_home_region() -> String {
    TokenManagerConfig::default().home_region
}

fn default_output_format() -> String {
    HttpTtsClientConfig::default().output_format
}

fn default_timeout() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            synthesis_url: default_synthesis_url(),
            app_id: default_app_id(),
            signing_key: default_signing_key(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            client_version: default_client_version(),
            home_region: default_home_region(),
            output_format: default_output_format(),
            timeout_secs: default_timeout(),
            hostname: None,
        }
    }
}

impl UpstreamConfig {
    /// 实际使用的主机名
    pub fn resolved_hostname(&self) -> String {
        self.hostname
            .clone()
            .filter(|h| !h.trim().is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// 合成客户端配置
    pub fn tts_client_config(&self) -> HttpTtsClientConfig {
        HttpTtsClientConfig {
            synthesis_url: self.synthesis_url.clone(),
            output_format: self.output_format.clone(),
            user_agent: self.user_agent.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    /// 令牌管理器配置
    pub fn token_manager_config(&self, token: &TokenConfig) -> TokenManagerConfig {
        TokenManagerConfig {
            token_url: self.token_url.clone(),
            app_id: self.app_id.clone(),
            signing_key: self.signing_key.clone(),
            user_agent: self.user_agent.clone(),
            accept_language: self.accept_language.clone(),
            client_version: self.client_version.clone(),
            home_region: self.home_region.clone(),
            hostname: self.resolved_hostname(),
            timeout_secs: self.timeout_secs,
            refresh_margin_secs: token.refresh_margin_secs,
            max_attempts: token.max_attempts,
            backoff_ms: token.backoff_ms,
        }
    }
}

/// 令牌刷新策略
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// 过期前多少秒开始刷新
    #[serde(default = "default_refresh_margin")]
    pub refresh_margin_secs: i64,

    /// 最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 线性退避基数（毫秒）
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_refresh_margin() -> i64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            refresh_margin_secs: default_refresh_margin(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// 合成流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 请求未指定时的并发数
    #[serde(default = "default_concurrency")]
    pub default_concurrency: usize,

    /// 请求并发数上限
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// 请求未指定时的分块长度
    #[serde(default = "default_chunk_len")]
    pub default_max_chunk_len: usize,

    #[serde(default = "default_min_chunk_len")]
    pub min_chunk_len: usize,

    #[serde(default = "default_max_chunk_len")]
    pub max_chunk_len: usize,

    /// 调度策略：batched | pooled
    #[serde(default)]
    pub policy: SchedulePolicy,

    /// 流式输出的通道容量
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_max_concurrency() -> usize {
    20
}

fn default_chunk_len() -> usize {
    DEFAULT_MAX_CHUNK_LEN
}

fn default_min_chunk_len() -> usize {
    50
}

fn default_max_chunk_len() -> usize {
    5000
}

fn default_stream_buffer() -> usize {
    DEFAULT_STREAM_BUFFER
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_concurrency: default_concurrency(),
            max_concurrency: default_max_concurrency(),
            default_max_chunk_len: default_chunk_len(),
            min_chunk_len: default_min_chunk_len(),
            max_chunk_len: default_max_chunk_len(),
            policy: SchedulePolicy::default(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

impl PipelineConfig {
    /// 将请求的并发数限制在 `[1, max_concurrency]`
    pub fn clamp_concurrency(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_concurrency)
            .clamp(1, self.max_concurrency.max(1))
    }

    /// 将请求的分块长度限制在 `[min_chunk_len, max_chunk_len]`
    pub fn clamp_chunk_len(&self, requested: Option<usize>) -> usize {
        let min = self.min_chunk_len.max(1);
        requested
            .unwrap_or(self.default_max_chunk_len)
            .clamp(min, self.max_chunk_len.max(min))
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5060);
        assert!(config.upstream.synthesis_url.contains("{region}"));
        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.token.refresh_margin_secs, 300);
        assert_eq!(config.pipeline.default_concurrency, 10);
        assert_eq!(config.pipeline.policy, SchedulePolicy::Batched);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5060");
    }

    #[test]
    fn test_clamp_concurrency() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.clamp_concurrency(None), 10);
        assert_eq!(pipeline.clamp_concurrency(Some(0)), 1);
        assert_eq!(pipeline.clamp_concurrency(Some(7)), 7);
        assert_eq!(pipeline.clamp_concurrency(Some(500)), 20);
    }

    #[test]
    fn test_clamp_chunk_len() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.clamp_chunk_len(None), 2000);
        assert_eq!(pipeline.clamp_chunk_len(Some(10)), 50);
        assert_eq!(pipeline.clamp_chunk_len(Some(9000)), 5000);
    }

    #[test]
    fn test_token_manager_config_carries_retry_policy() {
        let upstream = UpstreamConfig {
            hostname: Some("node-1".to_string()),
            ..Default::default()
        };
        let token = TokenConfig {
            max_attempts: 5,
            backoff_ms: 10,
            ..Default::default()
        };

        let config = upstream.token_manager_config(&token);
        assert_eq!(config.hostname, "node-1");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_ms, 10);
        assert_eq!(config.refresh_margin_secs, 300);
    }
}
