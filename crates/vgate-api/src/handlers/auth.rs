//! Token endpoint handlers
//!
//! `/auth` needs no authorization. Credentials are read from the request
//! data (JSON body merged over the query string).

use axum::http::Method;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use vgate_core::Credentials;

use crate::dispatch::ApiRequest;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

use super::json_ok;

const MISSING_CREDENTIALS: &str = "Username and password must be specified.";

/// POST | GET | DELETE /auth
pub async fn handle_auth(state: AppState, request: ApiRequest) -> Result<ApiResponse, ApiError> {
    match request.method {
        Method::POST => make_token(&state, &request.data()?).await,
        Method::GET => get_token(&state, &request.data()?),
        Method::DELETE => remove_token(&state, &request.data()?),
        _ => Err(ApiError::MethodNotAllowed("Method not supported.".to_string())),
    }
}

/// POST: issue a token for the credentials, verifying them first if configured
async fn make_token(state: &AppState, data: &Map<String, Value>) -> Result<ApiResponse, ApiError> {
    let credentials =
        credentials(data).ok_or_else(|| ApiError::BadRequest(MISSING_CREDENTIALS.to_string()))?;

    if let Some(verifier) = state.verifier() {
        if !verifier.verify(&credentials).await {
            warn!(username = %credentials.username, "Rejected credentials");
            return Err(ApiError::Unauthorized);
        }
    }

    let username = credentials.username.clone();
    let token = state.tokens().issue(credentials);
    info!(%username, "Issued API token");
    json_ok(&json!({ "token": token }))
}

/// GET: the active token for the credentials, or the expected request shape
fn get_token(state: &AppState, data: &Map<String, Value>) -> Result<ApiResponse, ApiError> {
    let Some(credentials) = credentials(data) else {
        return json_ok(&json!({ "username": "", "password": "" }));
    };

    match state.tokens().lookup(&credentials) {
        Some(token) => json_ok(&json!({ "token": token })),
        None => Err(ApiError::NotFound(
            "No token available for specified username/password.".to_string(),
        )),
    }
}

/// DELETE: revoke the token for the credentials
fn remove_token(state: &AppState, data: &Map<String, Value>) -> Result<ApiResponse, ApiError> {
    let credentials =
        credentials(data).ok_or_else(|| ApiError::BadRequest(MISSING_CREDENTIALS.to_string()))?;
    json_ok(&state.tokens().revoke(&credentials))
}

/// Both fields must be present; empty values are allowed
fn credentials(data: &Map<String, Value>) -> Option<Credentials> {
    Some(Credentials::new(
        field(data, "username")?,
        field(data, "password")?,
    ))
}

fn field(data: &Map<String, Value>, name: &str) -> Option<String> {
    match data.get(name)? {
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
