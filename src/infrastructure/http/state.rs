//! Application State

use crate::application::SynthesizeSpeechHandler;
use crate::config::PipelineConfig;

/// 应用状态
pub struct AppState {
    pub speech_handler: SynthesizeSpeechHandler,
    /// 请求参数限幅
    pub pipeline: PipelineConfig,
}

impl AppState {
    pub fn new(speech_handler: SynthesizeSpeechHandler, pipeline: PipelineConfig) -> Self {
        Self {
            speech_handler,
            pipeline,
        }
    }
}
