//! HTTP endpoint handlers
//!
//! Every handler has the shape `async fn(AppState, ApiRequest) -> Result<ApiResponse, ApiError>`
//! and decides for itself whether the request must be authorized.

pub mod auth;
pub mod devices;
pub mod platforms;

use serde::Serialize;
use serde_json::Value;

use crate::dispatch::ApiRequest;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /health
pub async fn health(_state: AppState, _request: ApiRequest) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::ok(Value::String("OK".to_string())))
}

/// 200 response carrying `body` as JSON
pub(crate) fn json_ok<T: Serialize>(body: &T) -> Result<ApiResponse, ApiError> {
    let value = serde_json::to_value(body)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;
    Ok(ApiResponse::ok(value))
}
