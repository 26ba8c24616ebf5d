//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::ErrorResponse;
use crate::application::ApplicationError;

/// 客户端在响应前断开（nginx 约定的 499）
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// 令牌不可用，服务暂时无法合成
    ServiceUnavailable(String),
    /// 上游合成失败或不可达
    BadGateway(String),
    ClientClosed,
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ClientClosed => {
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST)
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_request_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::BadGateway(_) => "upstream_error",
            ApiError::ClientClosed => "request_cancelled",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::ClientClosed => "client closed request".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Speech request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "Speech request rejected");
        }

        let body = ErrorResponse::new(status.as_u16(), self.kind(), message);
        (status, Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::InvalidInput(msg) => ApiError::BadRequest(msg),
            ApplicationError::TokenAcquisition(msg) => ApiError::ServiceUnavailable(msg),
            e @ ApplicationError::UpstreamSynthesis { .. } => ApiError::BadGateway(e.to_string()),
            ApplicationError::ExternalServiceError(msg) => ApiError::BadGateway(msg),
            ApplicationError::Cancelled => ApiError::ClientClosed,
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}
