//! Synthesis Pipeline - 合成调度与重组
//!
//! job → BatchScheduler → SegmentSink（BufferedAssembler / StreamingAssembler）

mod batch_scheduler;
mod job;
mod stream_assembler;

pub use batch_scheduler::{BatchScheduler, ScheduleReport};
pub use job::{OutputMode, SchedulePolicy, SynthesisJob, DEFAULT_CONCURRENCY};
pub use stream_assembler::{
    receiver_stream, BufferedAssembler, SegmentSink, StreamItem, StreamingAssembler,
};
