//! ttsgate - OpenAI 兼容的 TTS 代理
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 文本清洗、分段、音色参数、SSML 构建（纯函数，无 IO）
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, TokenProvider）
//! - Pipeline: 批次调度与有序重组（缓冲 / 流式）
//! - Commands: 合成命令处理器
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 上游合成客户端、会话令牌管理
//! - HTTP: `/v1/audio/speech` 与健康检查

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
