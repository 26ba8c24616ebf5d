//! Speech Commands - 语音合成命令

use bytes::Bytes;
use futures_util::stream::Stream;
use std::pin::Pin;

use crate::application::pipeline::StreamItem;
use crate::domain::{CleaningConfig, VoiceParams};

/// 合成语音命令
#[derive(Debug, Clone)]
pub struct SynthesizeSpeechCommand {
    /// 原始输入文本
    pub text: String,
    pub voice: VoiceParams,
    pub cleaning: CleaningConfig,
    /// 并发上限（每批片段数）
    pub concurrency: usize,
    /// 单片段最大字符数
    pub max_chunk_len: usize,
    /// 是否流式输出
    pub stream: bool,
}

/// 实时音频字节流
pub type SpeechStream = Pin<Box<dyn Stream<Item = StreamItem> + Send + 'static>>;

/// 合成结果
pub enum SpeechOutput {
    /// 完整音频
    Buffered(Bytes),
    /// 边合成边输出的字节流
    Streaming(SpeechStream),
}

impl std::fmt::Debug for SpeechOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechOutput::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            SpeechOutput::Streaming(_) => write!(f, "Streaming(..)"),
        }
    }
}
