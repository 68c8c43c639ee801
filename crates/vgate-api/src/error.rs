//! API error types and conversions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vgate_core::BackendError;

use crate::response::{format_response, json_headers, ApiResponse};

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// 401 Unauthorized (missing or inactive token)
    Unauthorized,
    /// 400 Bad Request
    BadRequest(String),
    /// 404 Not Found
    NotFound(String),
    /// 405 Method Not Allowed
    MethodNotAllowed(String),
    /// 502 Bad Gateway (backend failure or unexpected payload)
    BadGateway(String),
    /// 503 Service Unavailable
    ServiceUnavailable(String),
    /// 504 Gateway Timeout
    GatewayTimeout(String),
    /// 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        let status = err.status();
        let (error_type, message) = match err {
            ApiError::Unauthorized => return format_response(401, None),
            ApiError::BadRequest(msg) => ("bad_request", msg),
            ApiError::NotFound(msg) => ("not_found", msg),
            ApiError::MethodNotAllowed(msg) => ("method_not_allowed", msg),
            ApiError::BadGateway(msg) => ("bad_gateway", msg),
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg),
            ApiError::GatewayTimeout(msg) => ("gateway_timeout", msg),
            ApiError::Internal(msg) => ("internal_error", msg),
        };

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(error = error_type, %message, "API error");
        } else {
            tracing::debug!(error = error_type, %message, "API client error");
        }

        ApiResponse {
            status,
            body: json!({ "error": error_type, "message": message }).to_string(),
            headers: json_headers(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse::from(self).into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::AgentNotFound { .. } => ApiError::NotFound(err.to_string()),
            BackendError::Timeout(_) => ApiError::GatewayTimeout(err.to_string()),
            BackendError::Remote { message, .. } => ApiError::BadGateway(message),
            BackendError::Transport(msg) => ApiError::ServiceUnavailable(msg),
            BackendError::Protocol(msg) => ApiError::BadGateway(msg),
            BackendError::InvalidRequest(msg) => ApiError::BadRequest(msg),
        }
    }
}
