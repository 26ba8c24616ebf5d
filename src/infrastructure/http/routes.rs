//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping          GET   健康检查
//! - /v1/audio/speech   POST  OpenAI 兼容的语音合成

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ping", get(handlers::ping))
        .nest("/v1", openai_routes())
}

/// OpenAI 兼容路由
fn openai_routes() -> Router<Arc<AppState>> {
    Router::new().route("/audio/speech", post(handlers::create_speech))
}
