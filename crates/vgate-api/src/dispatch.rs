//! Request dispatcher and its axum adapter
//!
//! Every inbound request goes through [`Dispatcher::dispatch`]:
//!
//! ```text
//! request ──▶ OPTIONS? ──yes──▶ preflight envelope
//!                │no
//!                ▼
//!          RouteRegistry::resolve ──none──▶ 404 envelope
//!                │
//!                ▼
//!          handler (auth check is the handler's call) ──▶ response | error envelope
//! ```

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::ApiError;
use crate::registry::RouteRegistry;
use crate::response::{format_response, ApiResponse, ResponseKind};
use crate::state::AppState;

/// Largest request body accepted
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// An inbound request, detached from the HTTP server
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiRequest {
    /// Build a request with no headers and an empty body
    pub fn new(method: Method, uri: &str) -> Result<Self, ApiError> {
        let uri = uri
            .parse::<Uri>()
            .map_err(|e| ApiError::BadRequest(format!("Invalid request URI '{}': {}", uri, e)))?;
        Ok(Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        })
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_json(mut self, body: &Value) -> Self {
        self.body = Bytes::from(body.to_string());
        self
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Request data: the JSON object body merged over the query-string parameters.
    ///
    /// An empty body contributes nothing. A body that is not a JSON object is
    /// rejected.
    pub fn data(&self) -> Result<Map<String, Value>, ApiError> {
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&self.uri)
            .map_err(|e| ApiError::BadRequest(format!("Invalid query string: {}", e)))?;

        let mut data: Map<String, Value> = params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();

        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(data);
        }

        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(body)) => data.extend(body),
            Ok(_) => {
                return Err(ApiError::BadRequest(
                    "Request body must be a JSON object".to_string(),
                ))
            }
            Err(e) => return Err(ApiError::BadRequest(format!("Invalid JSON body: {}", e))),
        }
        Ok(data)
    }
}

/// Routes requests to their handlers and turns every outcome into a response
pub struct Dispatcher {
    state: AppState,
    routes: RouteRegistry,
}

impl Dispatcher {
    pub fn new(state: AppState, routes: RouteRegistry) -> Self {
        Self { state, routes }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle one request. Never fails: handler errors and panics become
    /// error envelopes.
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        if request.method == Method::OPTIONS {
            return format_response(ResponseKind::Preflight, None);
        }

        let Some(handler) = self.routes.resolve(request.path()) else {
            return ApiError::NotFound(format!("No endpoint at '{}'", request.path())).into();
        };

        debug!(method = %request.method, path = %request.path(), "Dispatching request");

        let outcome = AssertUnwindSafe(handler(self.state.clone(), request))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => err.into(),
            Err(_) => {
                error!("Handler panicked");
                ApiError::Internal("Request handler failed".to_string()).into()
            }
        }
    }
}

/// axum fallback handler feeding every request to the dispatcher
pub async fn serve(State(dispatcher): State<Arc<Dispatcher>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            return ApiError::BadRequest(format!("Failed to read request body: {}", e))
                .into_response()
        }
    };

    let request = ApiRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    };

    dispatcher.dispatch(request).await.into_response()
}
