//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod token_provider;
mod tts_engine;

pub use token_provider::{SessionToken, TokenError, TokenProviderPort};
pub use tts_engine::{AudioSegment, TtsEnginePort, TtsError};
