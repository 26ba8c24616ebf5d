//! Batch Scheduler - 片段合成调度
//!
//! 两种策略：
//! - Batched: 片段按 `concurrency` 切成连续批次，批内并发、批间串行。
//!   上游平台对单次调用窗口内同时外发的请求数有上限，无界并发会直接失败
//! - Pooled: 信号量限制同时在途的请求数，完成的片段进入按序号索引的重排缓冲区
//!
//! 两种策略下输出顺序都与输入顺序一致。任一片段失败即终止整个任务，
//! 已经交给 sink 的片段不会撤回

use futures_util::future::try_join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::job::{SchedulePolicy, SynthesisJob};
use super::stream_assembler::SegmentSink;
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioSegment, SessionToken, TokenProviderPort, TtsEnginePort};
use crate::domain::{TextChunk, VoiceParams};

/// 调度结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// 执行的批次数（Pooled 策略下为 0）
    pub batches: usize,
    /// 交给 sink 的片段数
    pub segments: usize,
    /// 交给 sink 的总字节数
    pub bytes: usize,
}

/// 片段合成调度器
pub struct BatchScheduler {
    engine: Arc<dyn TtsEnginePort>,
    tokens: Arc<dyn TokenProviderPort>,
    policy: SchedulePolicy,
}

impl BatchScheduler {
    pub fn new(
        engine: Arc<dyn TtsEnginePort>,
        tokens: Arc<dyn TokenProviderPort>,
        policy: SchedulePolicy,
    ) -> Self {
        Self {
            engine,
            tokens,
            policy,
        }
    }

    /// 执行任务，按原始顺序把片段交给 sink
    pub async fn run(
        &self,
        job: &SynthesisJob,
        sink: &mut dyn SegmentSink,
        cancel: &CancellationToken,
    ) -> Result<ScheduleReport, ApplicationError> {
        tracing::debug!(
            chunks = job.chunks.len(),
            concurrency = job.concurrency,
            policy = ?self.policy,
            "Scheduling synthesis job"
        );

        match self.policy {
            SchedulePolicy::Batched => self.run_batched(job, sink, cancel).await,
            SchedulePolicy::Pooled => self.run_pooled(job, sink, cancel).await,
        }
    }

    async fn fetch_token(&self, cancel: &CancellationToken) -> Result<SessionToken, ApplicationError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ApplicationError::Cancelled),
            token = self.tokens.get_token() => Ok(token?),
        }
    }

    /// 合成单个片段；令牌被上游拒绝时作废缓存
    async fn synthesize_one(
        &self,
        chunk: &TextChunk,
        voice: &VoiceParams,
        token: &SessionToken,
    ) -> Result<AudioSegment, ApplicationError> {
        match self.engine.synthesize(chunk, voice, token).await {
            Ok(segment) => Ok(segment),
            Err(e) => {
                tracing::error!(chunk = chunk.index, error = %e, "Chunk synthesis failed");
                if e.is_unauthorized() {
                    self.tokens.invalidate().await;
                }
                Err(ApplicationError::from_tts(chunk.index, e))
            }
        }
    }

    async fn emit(
        sink: &mut dyn SegmentSink,
        segment: AudioSegment,
        report: &mut ScheduleReport,
    ) -> Result<(), ApplicationError> {
        let len = segment.data.len();
        sink.accept(segment).await?;
        report.segments += 1;
        report.bytes += len;
        Ok(())
    }

    async fn run_batched(
        &self,
        job: &SynthesisJob,
        sink: &mut dyn SegmentSink,
        cancel: &CancellationToken,
    ) -> Result<ScheduleReport, ApplicationError> {
        let mut report = ScheduleReport::default();
        let total = job.batch_count();

        for (batch_no, batch) in job.chunks.chunks(job.concurrency).enumerate() {
            if cancel.is_cancelled() {
                return Err(ApplicationError::Cancelled);
            }

            // 每批开始前确认令牌仍在有效期内
            let token = self.fetch_token(cancel).await?;

            let calls = batch
                .iter()
                .map(|chunk| self.synthesize_one(chunk, &job.voice, &token));

            // try_join_all 保持结果与输入一一对应；首个失败会丢弃同批其余请求
            let segments = tokio::select! {
                _ = cancel.cancelled() => return Err(ApplicationError::Cancelled),
                result = try_join_all(calls) => result?,
            };
            report.batches += 1;

            tracing::debug!(
                batch = batch_no + 1,
                total_batches = total,
                size = batch.len(),
                "Batch completed"
            );

            for segment in segments {
                Self::emit(sink, segment, &mut report).await?;
            }
        }

        Ok(report)
    }

    async fn run_pooled(
        &self,
        job: &SynthesisJob,
        sink: &mut dyn SegmentSink,
        cancel: &CancellationToken,
    ) -> Result<ScheduleReport, ApplicationError> {
        let mut report = ScheduleReport::default();
        let semaphore = Arc::new(Semaphore::new(job.concurrency));

        let mut pending: FuturesUnordered<_> = job
            .chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| {
                let semaphore = semaphore.clone();
                async move {
                    // 持有 permit 直到请求完成
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| ApplicationError::internal(e.to_string()))?;
                    let token = self.tokens.get_token().await?;
                    let segment = self.synthesize_one(chunk, &job.voice, &token).await?;
                    Ok::<_, ApplicationError>((position, segment))
                }
            })
            .collect();

        // 按位置重排，前缀就绪即输出
        let mut ready: BTreeMap<usize, AudioSegment> = BTreeMap::new();
        let mut next = 0;

        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return Err(ApplicationError::Cancelled),
                item = pending.next() => item,
            };
            let Some(result) = item else { break };

            let (position, segment) = result?;
            ready.insert(position, segment);

            while let Some(segment) = ready.remove(&next) {
                Self::emit(sink, segment, &mut report).await?;
                next += 1;
            }
        }

        Ok(report)
    }
}
