//! Speech Handler - OpenAI 兼容的语音合成接口

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::SpeechOutput;
use crate::infrastructure::http::dto::SpeechRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

const AUDIO_MPEG: &str = "audio/mpeg";

/// POST /v1/audio/speech
///
/// 非流式返回完整音频；流式以分块传输逐段输出
pub async fn create_speech(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    let cmd = req.into_command(&state.pipeline);

    // 处理函数被丢弃（客户端断开）时取消任务
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let output = state.speech_handler.handle(cmd, cancel).await?;

    let response = match output {
        SpeechOutput::Buffered(audio) => {
            ([(header::CONTENT_TYPE, AUDIO_MPEG)], Body::from(audio)).into_response()
        }
        SpeechOutput::Streaming(stream) => {
            // 流自身持有取消守卫，生命周期交给响应体
            guard.disarm();
            ([(header::CONTENT_TYPE, AUDIO_MPEG)], Body::from_stream(stream)).into_response()
        }
    };

    Ok(response)
}
