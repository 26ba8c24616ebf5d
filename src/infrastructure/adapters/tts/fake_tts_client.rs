//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 不访问网络，按片段生成可辨识的字节，支持按序号注入延迟与失败

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::ports::{AudioSegment, SessionToken, TtsEnginePort, TtsError};
use crate::domain::{TextChunk, VoiceParams};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 按片段序号计算模拟延迟
    pub latency: fn(usize) -> Duration,
    /// 这些序号的片段返回上游错误
    pub fail_on: Vec<usize>,
    /// 注入错误的 HTTP 状态码
    pub fail_status: u16,
}

fn default_latency(_: usize) -> Duration {
    Duration::from_millis(5)
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            latency: default_latency,
            fail_on: Vec::new(),
            fail_status: 500,
        }
    }
}

/// 在途计数守卫，请求结束或被丢弃时减一
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fake TTS Client
///
/// 记录调用次数与峰值并发，供调度测试断言
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        Self {
            config,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// 片段对应的假音频：`<序号:文本>`
    pub fn audio_for(chunk: &TextChunk) -> Bytes {
        Bytes::from(format!("<{}:{}>", chunk.index, chunk.content))
    }

    /// 已发起的调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 当前在途的请求数
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 同时在途的最大请求数
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceParams,
        _token: &SessionToken,
    ) -> Result<AudioSegment, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        tracing::debug!(
            chunk = chunk.index,
            voice = %voice.voice,
            "FakeTtsClient: synthesizing"
        );

        tokio::time::sleep((self.config.latency)(chunk.index)).await;

        if self.config.fail_on.contains(&chunk.index) {
            return Err(TtsError::Upstream {
                status: self.config.fail_status,
                body: format!("forced failure on chunk {}", chunk.index),
            });
        }

        Ok(AudioSegment::new(chunk.index, Self::audio_for(chunk)))
    }
}
