//! Platform listing handler

use crate::dispatch::ApiRequest;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

use super::json_ok;

/// GET /platforms
///
/// Names of the connected platforms as `{name: null, ...}`.
pub async fn platforms_list(state: AppState, request: ApiRequest) -> Result<ApiResponse, ApiError> {
    state.authorize(&request)?;
    let platforms = state.resolver().platforms_list().await?;
    json_ok(&platforms)
}
