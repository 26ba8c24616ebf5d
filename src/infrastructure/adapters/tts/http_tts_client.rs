//! HTTP TTS Client - 调用上游神经网络 TTS 服务
//!
//! 实现 TtsEnginePort trait，每个片段一次 POST
//!
//! 上游 API:
//! POST https://{region}.tts.speech.microsoft.com/cognitiveservices/v1
//! Request: SSML 文档，Authorization 为会话令牌
//! Response: 原始音频字节（格式由 X-Microsoft-OutputFormat 指定）

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{AudioSegment, SessionToken, TtsEnginePort, TtsError};
use crate::domain::{build_ssml, TextChunk, VoiceParams};

/// 区域占位符
pub const REGION_PLACEHOLDER: &str = "{region}";

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// 合成端点模板，`{region}` 会被替换为令牌中的区域
    pub synthesis_url: String,
    /// 输出格式
    pub output_format: String,
    /// 模拟移动端的 User-Agent
    pub user_agent: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            synthesis_url: "https://{region}.tts.speech.microsoft.com/cognitiveservices/v1"
                .to_string(),
            output_format: "audio-24khz-48kbitrate-mono-mp3".to_string(),
            user_agent: "okhttp/4.5.0".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(synthesis_url: impl Into<String>) -> Self {
        Self {
            synthesis_url: synthesis_url.into(),
            ..Default::default()
        }
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取区域合成 URL
    fn synthesis_url(&self, region: &str) -> String {
        self.config.synthesis_url.replace(REGION_PLACEHOLDER, region)
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceParams,
        token: &SessionToken,
    ) -> Result<AudioSegment, TtsError> {
        let url = self.synthesis_url(&token.region);
        let ssml = build_ssml(&chunk.content, voice);

        tracing::debug!(
            url = %url,
            chunk = chunk.index,
            text_len = chunk.content.len(),
            voice = %voice.voice,
            "Sending synthesis request"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &token.bearer)
            .header(CONTENT_TYPE, "application/ssml+xml")
            .header(USER_AGENT, &self.config.user_agent)
            .header("X-Microsoft-OutputFormat", &self.config.output_format)
            .body(ssml)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        tracing::debug!(
            chunk = chunk.index,
            audio_size = audio_data.len(),
            "Chunk synthesized"
        );

        Ok(AudioSegment::new(chunk.index, audio_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn token() -> SessionToken {
        SessionToken::new("eastus", "bearer-abc", i64::MAX)
    }

    #[test]
    fn test_config_default() {
        let config = HttpTtsClientConfig::default();
        assert!(config.synthesis_url.contains(REGION_PLACEHOLDER));
        assert_eq!(config.output_format, "audio-24khz-48kbitrate-mono-mp3");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_synthesis_url_uses_region() {
        let client = HttpTtsClient::new(HttpTtsClientConfig::default()).unwrap();
        assert_eq!(
            client.synthesis_url("westeurope"),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }

    #[tokio::test]
    async fn test_synthesize_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/eastus/cognitiveservices/v1")
            .match_header("authorization", "bearer-abc")
            .match_header("content-type", "application/ssml+xml")
            .match_header("x-microsoft-outputformat", "audio-24khz-48kbitrate-mono-mp3")
            .match_header("user-agent", "okhttp/4.5.0")
            .match_body(Matcher::Regex("<prosody rate=\"0%\" pitch=\"0%\">a &amp; b</prosody>".into()))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"ID3-audio")
            .create_async()
            .await;

        let config = HttpTtsClientConfig::new(format!(
            "{}/{{region}}/cognitiveservices/v1",
            server.url()
        ));
        let client = HttpTtsClient::new(config).unwrap();

        let segment = client
            .synthesize(&TextChunk::new(7, "a & b"), &VoiceParams::default(), &token())
            .await
            .unwrap();

        assert_eq!(segment.index, 7);
        assert_eq!(&segment.data[..], b"ID3-audio");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_synthesize_upstream_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/eastus/cognitiveservices/v1")
            .with_status(500)
            .with_body("engine exploded")
            .expect(1)
            .create_async()
            .await;

        let config = HttpTtsClientConfig::new(format!(
            "{}/{{region}}/cognitiveservices/v1",
            server.url()
        ));
        let client = HttpTtsClient::new(config).unwrap();

        let err = client
            .synthesize(&TextChunk::new(0, "hi"), &VoiceParams::default(), &token())
            .await
            .unwrap_err();

        match err {
            TtsError::Upstream { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "engine exploded");
            }
            other => panic!("unexpected error: {}", other),
        }
        // 不在本层重试
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_detected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let client =
            HttpTtsClient::new(HttpTtsClientConfig::new(format!("{}/{{region}}", server.url())))
                .unwrap();

        let err = client
            .synthesize(&TextChunk::new(0, "hi"), &VoiceParams::default(), &token())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }
}
