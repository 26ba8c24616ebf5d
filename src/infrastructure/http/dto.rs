//! Data Transfer Objects
//!
//! OpenAI 兼容的 `/v1/audio/speech` 请求体

use serde::{Deserialize, Serialize};

use crate::application::SynthesizeSpeechCommand;
use crate::config::PipelineConfig;
use crate::domain::{CleaningConfig, VoiceParams};

/// 语音合成请求
#[derive(Debug, Default, Deserialize)]
pub struct SpeechRequest {
    /// 仅为兼容 OpenAI 客户端，不参与合成
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub input: String,
    /// OpenAI 音色名或神经网络音色名
    #[serde(default)]
    pub voice: Option<String>,
    /// 语速倍率，1.0 为原速
    #[serde(default)]
    pub speed: Option<f32>,
    /// 音调倍率，1.0 为原调
    #[serde(default)]
    pub pitch: Option<f32>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "styleDegree")]
    pub style_degree: Option<f32>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default, alias = "max_chunk_len", alias = "maxChunkLength")]
    pub max_chunk_length: Option<usize>,
    #[serde(default, alias = "cleaningOptions")]
    pub cleaning_options: CleaningOptionsDto,
}

/// 文本清洗选项，缺省字段取默认值（全部开启）
#[derive(Debug, Default, Deserialize)]
pub struct CleaningOptionsDto {
    #[serde(default)]
    pub remove_urls: Option<bool>,
    #[serde(default)]
    pub remove_markdown: Option<bool>,
    #[serde(default)]
    pub remove_emoji: Option<bool>,
    #[serde(default, alias = "remove_citation")]
    pub remove_citation_numbers: Option<bool>,
    #[serde(default)]
    pub remove_line_breaks: Option<bool>,
    #[serde(default)]
    pub custom_keywords: Option<String>,
}

impl From<CleaningOptionsDto> for CleaningConfig {
    fn from(dto: CleaningOptionsDto) -> Self {
        let defaults = CleaningConfig::default();
        Self {
            remove_urls: dto.remove_urls.unwrap_or(defaults.remove_urls),
            remove_markdown: dto.remove_markdown.unwrap_or(defaults.remove_markdown),
            remove_emoji: dto.remove_emoji.unwrap_or(defaults.remove_emoji),
            remove_citation_numbers: dto
                .remove_citation_numbers
                .unwrap_or(defaults.remove_citation_numbers),
            remove_line_breaks: dto.remove_line_breaks.unwrap_or(defaults.remove_line_breaks),
            custom_keywords: dto.custom_keywords.unwrap_or(defaults.custom_keywords),
        }
    }
}

impl SpeechRequest {
    /// 转换为合成命令，并发数与分块长度按流水线配置限幅
    pub fn into_command(self, pipeline: &PipelineConfig) -> SynthesizeSpeechCommand {
        let mut voice = VoiceParams::new(self.voice.as_deref().unwrap_or_default())
            .with_speed(self.speed.unwrap_or(1.0))
            .with_pitch(self.pitch.unwrap_or(1.0))
            .with_style(self.style.as_deref().unwrap_or_default())
            .with_role(self.role.as_deref().unwrap_or_default());
        if let Some(degree) = self.style_degree {
            voice = voice.with_style_degree(degree);
        }

        SynthesizeSpeechCommand {
            text: self.input,
            voice,
            cleaning: self.cleaning_options.into(),
            concurrency: pipeline.clamp_concurrency(self.concurrency),
            max_chunk_len: pipeline.clamp_chunk_len(self.max_chunk_length),
            stream: self.stream,
        }
    }
}

/// OpenAI 风格的错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(code: u16, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                kind,
                code,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_request_defaults() {
        let req: SpeechRequest = serde_json::from_str(r#"{"input":"hi"}"#).unwrap();
        let cmd = req.into_command(&PipelineConfig::default());

        assert_eq!(cmd.text, "hi");
        assert_eq!(cmd.voice, VoiceParams::default());
        assert_eq!(cmd.cleaning, CleaningConfig::default());
        assert_eq!(cmd.concurrency, 10);
        assert_eq!(cmd.max_chunk_len, 2000);
        assert!(!cmd.stream);
    }

    #[test]
    fn test_openai_request_mapping() {
        let req: SpeechRequest = serde_json::from_str(
            r#"{
                "model": "tts-1",
                "input": "hello",
                "voice": "echo",
                "speed": 1.25,
                "style": "cheerful",
                "style_degree": 5.0,
                "stream": true,
                "concurrency": 99,
                "max_chunk_length": 10
            }"#,
        )
        .unwrap();
        let cmd = req.into_command(&PipelineConfig::default());

        assert_eq!(cmd.voice.voice, "zh-CN-YunxiNeural");
        assert_eq!(cmd.voice.rate, 25);
        assert_eq!(cmd.voice.pitch, 0);
        assert_eq!(cmd.voice.style, "cheerful");
        assert_eq!(cmd.voice.style_degree, 2.0);
        assert!(cmd.stream);
        assert_eq!(cmd.concurrency, 20);
        assert_eq!(cmd.max_chunk_len, 50);
    }

    #[test]
    fn test_partial_cleaning_options() {
        let req: SpeechRequest = serde_json::from_str(
            r#"{"input":"x","cleaning_options":{"remove_urls":false,"custom_keywords":"See"}}"#,
        )
        .unwrap();
        let cleaning: CleaningConfig = req.cleaning_options.into();

        assert!(!cleaning.remove_urls);
        assert!(cleaning.remove_markdown);
        assert!(cleaning.remove_emoji);
        assert_eq!(cleaning.custom_keywords, "See");
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new(502, "upstream_error", "boom")).unwrap();
        assert_eq!(body["error"]["message"], "boom");
        assert_eq!(body["error"]["type"], "upstream_error");
        assert_eq!(body["error"]["code"], 502);
    }
}
