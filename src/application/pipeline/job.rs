//! 合成任务定义

use serde::Deserialize;
use std::sync::Arc;

use crate::domain::{TextChunk, VoiceParams};

/// 默认并发数（每批片段数）
pub const DEFAULT_CONCURRENCY: usize = 10;

/// 输出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// 全部完成后一次性返回
    Buffered,
    /// 边合成边输出
    Streaming,
}

/// 调度策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePolicy {
    /// 顺序批次，批内并发；满足平台对同时外发请求数的上限
    #[default]
    Batched,
    /// 信号量限流的工作池，不等待整批完成
    Pooled,
}

/// 一次端到端的合成任务
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    /// 按原始顺序排列的片段
    pub chunks: Vec<TextChunk>,
    /// 所有片段共享的音色参数
    pub voice: Arc<VoiceParams>,
    /// 并发上限（至少为 1）
    pub concurrency: usize,
    pub mode: OutputMode,
}

impl SynthesisJob {
    pub fn new(
        chunks: Vec<TextChunk>,
        voice: VoiceParams,
        concurrency: usize,
        mode: OutputMode,
    ) -> Self {
        Self {
            chunks,
            voice: Arc::new(voice),
            concurrency: concurrency.max(1),
            mode,
        }
    }

    /// Batched 策略下的批次数 `ceil(M / K)`
    pub fn batch_count(&self) -> usize {
        self.chunks.len().div_ceil(self.concurrency)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chunk_text;

    #[test]
    fn test_batch_count() {
        let chunks = chunk_text(&"a.".repeat(25), 2);
        assert_eq!(chunks.len(), 25);

        let job = SynthesisJob::new(chunks, VoiceParams::default(), 10, OutputMode::Buffered);
        assert_eq!(job.batch_count(), 3);
    }

    #[test]
    fn test_concurrency_at_least_one() {
        let job = SynthesisJob::new(Vec::new(), VoiceParams::default(), 0, OutputMode::Streaming);
        assert_eq!(job.concurrency, 1);
        assert_eq!(job.batch_count(), 0);
        assert!(job.is_empty());
    }
}
