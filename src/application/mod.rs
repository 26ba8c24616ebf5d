//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、TokenProvider）
//! - pipeline: 批次调度与音频重组
//! - commands: 合成命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod pipeline;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{SynthesizeSpeechHandler, DEFAULT_STREAM_BUFFER},
    SpeechOutput, SpeechStream, SynthesizeSpeechCommand,
};

pub use error::ApplicationError;

pub use pipeline::{
    BatchScheduler, BufferedAssembler, OutputMode, ScheduleReport, SchedulePolicy, SegmentSink,
    StreamingAssembler, SynthesisJob, DEFAULT_CONCURRENCY,
};

pub use ports::{
    AudioSegment, SessionToken, TokenError, TokenProviderPort, TtsEnginePort, TtsError,
};
