//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::infrastructure::adapters::REGION_PLACEHOLDER;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "TTSGATE";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `TTSGATE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值（见 `types.rs` 中的 serde default）
///
/// # 环境变量示例
/// - `TTSGATE_SERVER__PORT=8080`
/// - `TTSGATE_PIPELINE__POLICY=pooled`
/// - `TTSGATE_TOKEN__MAX_ATTEMPTS=5`
/// - `TTSGATE_UPSTREAM__HOSTNAME=worker-1`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 2. 添加环境变量（最高优先级）
    // 例如: TTSGATE_UPSTREAM__TIMEOUT_SECS=60
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    // 缺省字段由 serde default 补齐
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("Server port cannot be 0"));
    }

    let upstream = &config.upstream;
    if upstream.token_url.trim().is_empty() {
        return Err(invalid("Token URL cannot be empty"));
    }
    if upstream.synthesis_url.trim().is_empty() {
        return Err(invalid("Synthesis URL cannot be empty"));
    }
    if !upstream.synthesis_url.contains(REGION_PLACEHOLDER) {
        return Err(ConfigError::ValidationError(format!(
            "Synthesis URL must contain {}",
            REGION_PLACEHOLDER
        )));
    }
    if STANDARD.decode(upstream.signing_key.trim()).is_err() {
        return Err(invalid("Signing key must be valid base64"));
    }

    if config.token.max_attempts == 0 {
        return Err(invalid("Token max_attempts cannot be 0"));
    }
    if config.token.refresh_margin_secs < 0 {
        return Err(invalid("Token refresh margin cannot be negative"));
    }

    let pipeline = &config.pipeline;
    if pipeline.default_concurrency == 0 || pipeline.max_concurrency == 0 {
        return Err(invalid("Pipeline concurrency cannot be 0"));
    }
    if pipeline.min_chunk_len == 0 || pipeline.min_chunk_len > pipeline.max_chunk_len {
        return Err(invalid(
            "Chunk length bounds must satisfy 0 < min_chunk_len <= max_chunk_len",
        ));
    }
    if pipeline.stream_buffer == 0 {
        return Err(invalid("Stream buffer cannot be 0"));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
///
/// 签名密钥不输出
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Token URL: {}", config.upstream.token_url);
    tracing::info!("Synthesis URL: {}", config.upstream.synthesis_url);
    tracing::info!("Output Format: {}", config.upstream.output_format);
    tracing::info!("Upstream Timeout: {}s", config.upstream.timeout_secs);
    tracing::info!(
        "Token Refresh: margin {}s, {} attempts, backoff {}ms",
        config.token.refresh_margin_secs,
        config.token.max_attempts,
        config.token.backoff_ms
    );
    tracing::info!(
        "Pipeline: policy {:?}, concurrency {} (max {}), chunk {} ({}..={})",
        config.pipeline.policy,
        config.pipeline.default_concurrency,
        config.pipeline.max_concurrency,
        config.pipeline.default_max_chunk_len,
        config.pipeline.min_chunk_len,
        config.pipeline.max_chunk_len
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SchedulePolicy;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_token_url() {
        let mut config = AppConfig::default();
        config.upstream.token_url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_missing_region_placeholder() {
        let mut config = AppConfig::default();
        config.upstream.synthesis_url = "https://eastus.example.com/v1".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_bad_signing_key() {
        let mut config = AppConfig::default();
        config.upstream.signing_key = "%%%".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_attempts() {
        let mut config = AppConfig::default();
        config.token.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_concurrency() {
        let mut config = AppConfig::default();
        config.pipeline.max_concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_inverted_chunk_bounds() {
        let mut config = AppConfig::default();
        config.pipeline.min_chunk_len = 6000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8181

[token]
max_attempts = 5

[pipeline]
policy = "pooled"
default_concurrency = 4
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8181);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.token.max_attempts, 5);
        assert_eq!(config.token.backoff_ms, 1000);
        assert_eq!(config.pipeline.policy, SchedulePolicy::Pooled);
        assert_eq!(config.pipeline.default_concurrency, 4);
        assert_eq!(config.pipeline.max_concurrency, 20);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 0").unwrap();

        let err = load_config_from_path(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
