//! ttsgate - OpenAI 兼容的 TTS 代理
//!
//! 启动流程：加载配置 → 初始化日志 → 组装令牌管理器、合成客户端与调度器 → 启动 HTTP 服务

use std::sync::Arc;

use ttsgate::application::{BatchScheduler, SynthesizeSpeechHandler};
use ttsgate::config::{load_config, print_config};
use ttsgate::infrastructure::adapters::{HttpTtsClient, SessionTokenManager};
use ttsgate::infrastructure::http::{AppState, HttpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},ttsgate={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("ttsgate - OpenAI compatible TTS proxy");
    print_config(&config);

    // 会话令牌管理器
    let token_config = config.upstream.token_manager_config(&config.token);
    let tokens = Arc::new(SessionTokenManager::new(token_config)?);

    // 上游合成客户端
    let tts_engine = Arc::new(HttpTtsClient::new(config.upstream.tts_client_config())?);

    // 调度器与命令处理器
    let scheduler = Arc::new(BatchScheduler::new(
        tts_engine,
        tokens,
        config.pipeline.policy,
    ));
    let speech_handler =
        SynthesizeSpeechHandler::new(scheduler).with_stream_buffer(config.pipeline.stream_buffer);

    let state = AppState::new(speech_handler, config.pipeline.clone());
    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
