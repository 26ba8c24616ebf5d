//! Stream Assembler - 音频片段重组
//!
//! 调度器按原始片段顺序把 AudioSegment 交给 SegmentSink：
//! - BufferedAssembler: 拼接为一个完整缓冲区
//! - StreamingAssembler: 通过 channel 实时推给 HTTP 响应体

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

use crate::application::error::ApplicationError;
use crate::application::ports::AudioSegment;

/// 流中的单个元素
pub type StreamItem = Result<Bytes, ApplicationError>;

/// 有序片段的接收端
#[async_trait]
pub trait SegmentSink: Send {
    /// 接收下一个片段，调用方保证按原始顺序调用
    async fn accept(&mut self, segment: AudioSegment) -> Result<(), ApplicationError>;
}

/// 缓冲模式：全部完成后一次性返回
#[derive(Debug, Default)]
pub struct BufferedAssembler {
    buffer: BytesMut,
    segments: usize,
}

impl BufferedAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已接收的片段数
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// 取出拼接后的完整音频
    pub fn finish(self) -> Bytes {
        self.buffer.freeze()
    }
}

#[async_trait]
impl SegmentSink for BufferedAssembler {
    async fn accept(&mut self, segment: AudioSegment) -> Result<(), ApplicationError> {
        self.buffer.extend_from_slice(&segment.data);
        self.segments += 1;
        Ok(())
    }
}

/// 流式模式：每个片段一到就写入 channel
///
/// channel 另一端是 HTTP 响应体；接收端被丢弃（客户端断开）时返回 Cancelled
pub struct StreamingAssembler {
    tx: mpsc::Sender<StreamItem>,
    segments: usize,
}

impl StreamingAssembler {
    /// 创建 assembler 及其对应的接收端
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<StreamItem>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx, segments: 0 }, rx)
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    /// 向下游发出错误并结束流
    ///
    /// 已经发出的字节不会撤回，客户端会收到一个被截断的音频流
    pub async fn abort(self, err: ApplicationError) {
        if self.tx.send(Err(err)).await.is_err() {
            tracing::debug!("Stream receiver already dropped, error not delivered");
        }
    }
}

#[async_trait]
impl SegmentSink for StreamingAssembler {
    async fn accept(&mut self, segment: AudioSegment) -> Result<(), ApplicationError> {
        self.tx
            .send(Ok(segment.data))
            .await
            .map_err(|_| ApplicationError::Cancelled)?;
        self.segments += 1;
        Ok(())
    }
}

/// 把接收端包装为字节流
///
/// `guard` 随流一起存活，流被丢弃时取消仍在进行的上游调用
pub fn receiver_stream(
    first: Option<Bytes>,
    rx: mpsc::Receiver<StreamItem>,
    guard: DropGuard,
) -> impl Stream<Item = StreamItem> + Send + 'static {
    let head = stream::iter(first.map(Ok));
    let tail = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv().await.map(|item| (item, (rx, guard)))
    });
    head.chain(tail)
}
