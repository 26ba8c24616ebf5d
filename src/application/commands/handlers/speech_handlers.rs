//! Speech Command Handlers
//!
//! 原始文本 → 清洗 → 分段 → 调度合成 → 重组输出

use futures_util::stream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::commands::speech_commands::*;
use crate::application::error::ApplicationError;
use crate::application::pipeline::{
    receiver_stream, BatchScheduler, BufferedAssembler, OutputMode, StreamingAssembler,
    SynthesisJob,
};
use crate::domain::{chunk_text, normalize};

/// 流式输出 channel 的默认容量
pub const DEFAULT_STREAM_BUFFER: usize = 16;

/// SynthesizeSpeech Handler - 合成语音
pub struct SynthesizeSpeechHandler {
    scheduler: Arc<BatchScheduler>,
    stream_buffer: usize,
}

impl SynthesizeSpeechHandler {
    pub fn new(scheduler: Arc<BatchScheduler>) -> Self {
        Self {
            scheduler,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    pub fn with_stream_buffer(mut self, stream_buffer: usize) -> Self {
        self.stream_buffer = stream_buffer.max(1);
        self
    }

    /// 执行合成
    ///
    /// `cancel` 被取消时在途的上游请求随之放弃。流式模式下返回的流持有取消守卫，
    /// 流被丢弃（客户端断开）同样会取消任务
    pub async fn handle(
        &self,
        cmd: SynthesizeSpeechCommand,
        cancel: CancellationToken,
    ) -> Result<SpeechOutput, ApplicationError> {
        if cmd.text.trim().is_empty() {
            return Err(ApplicationError::invalid_input("input text is empty"));
        }

        let normalized = normalize(&cmd.text, &cmd.cleaning);
        let chunks = chunk_text(&normalized, cmd.max_chunk_len);

        let mode = if cmd.stream {
            OutputMode::Streaming
        } else {
            OutputMode::Buffered
        };
        let job = SynthesisJob::new(chunks, cmd.voice, cmd.concurrency, mode);

        tracing::info!(
            input_chars = cmd.text.chars().count(),
            normalized_chars = normalized.chars().count(),
            chunks = job.chunks.len(),
            batches = job.batch_count(),
            concurrency = job.concurrency,
            voice = %job.voice.voice,
            stream = cmd.stream,
            "Synthesis job created"
        );

        if job.is_empty() {
            tracing::warn!("Text is empty after cleaning, nothing to synthesize");
            return Ok(match mode {
                OutputMode::Buffered => SpeechOutput::Buffered(Default::default()),
                OutputMode::Streaming => SpeechOutput::Streaming(Box::pin(stream::empty())),
            });
        }

        match mode {
            OutputMode::Buffered => self.run_buffered(job, cancel).await,
            OutputMode::Streaming => self.run_streaming(job, cancel).await,
        }
    }

    async fn run_buffered(
        &self,
        job: SynthesisJob,
        cancel: CancellationToken,
    ) -> Result<SpeechOutput, ApplicationError> {
        let mut sink = BufferedAssembler::new();
        let report = self.scheduler.run(&job, &mut sink, &cancel).await?;

        tracing::info!(
            segments = report.segments,
            batches = report.batches,
            bytes = report.bytes,
            "Synthesis job completed"
        );

        Ok(SpeechOutput::Buffered(sink.finish()))
    }

    async fn run_streaming(
        &self,
        job: SynthesisJob,
        cancel: CancellationToken,
    ) -> Result<SpeechOutput, ApplicationError> {
        // 守卫从此刻起生效：本函数或返回的流被丢弃都会取消生产者
        let guard = cancel.clone().drop_guard();
        let (mut sink, mut rx) = StreamingAssembler::channel(self.stream_buffer);

        let scheduler = self.scheduler.clone();
        tokio::spawn(async move {
            match scheduler.run(&job, &mut sink, &cancel).await {
                Ok(report) => {
                    tracing::info!(
                        segments = report.segments,
                        batches = report.batches,
                        bytes = report.bytes,
                        "Streaming job completed"
                    );
                }
                Err(ApplicationError::Cancelled) => {
                    tracing::info!(
                        delivered = sink.segments(),
                        "Streaming job cancelled by client"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        delivered = sink.segments(),
                        error = %e,
                        "Streaming job failed, aborting stream"
                    );
                    sink.abort(e).await;
                }
            }
        });

        // 等第一个片段再提交响应头，首批失败时仍能返回干净的错误响应
        match rx.recv().await {
            Some(Ok(first)) => Ok(SpeechOutput::Streaming(Box::pin(receiver_stream(
                Some(first),
                rx,
                guard,
            )))),
            Some(Err(e)) => Err(e),
            None => Err(ApplicationError::Cancelled),
        }
    }
}
