//! 应用层 - 命令
//!
//! 语音合成命令及其处理器

mod speech_commands;

pub mod handlers;

pub use speech_commands::*;
