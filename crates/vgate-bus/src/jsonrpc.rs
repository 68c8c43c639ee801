//! JsonRpcBus - BackendClient that reaches the bus through an HTTP JSON-RPC bridge
//!
//! Every operation is a JSON-RPC 2.0 request POSTed to the bridge URL:
//!
//! ```text
//! {"jsonrpc": "2.0", "id": "<uuid>", "method": "peerlist", "params": {}}
//! {"jsonrpc": "2.0", "id": "<uuid>", "method": "call",
//!  "params": {"peer": "<target>", "method": "<method>", "args": [...]}}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;
use vgate_core::{BackendClient, BackendError, BackendResult};

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const JSONRPC_VERSION: &str = "2.0";
const PEERLIST_METHOD: &str = "peerlist";
const CALL_METHOD: &str = "call";

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'a str,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// A `BackendClient` that forwards peer listing and calls to a JSON-RPC bridge
#[derive(Debug, Clone)]
pub struct JsonRpcBus {
    client: Client,
    url: Url,
}

impl JsonRpcBus {
    /// Create a bus client for the bridge at `url`
    pub fn new(url: &str) -> BackendResult<Self> {
        Self::with_auth(url, None)
    }

    /// Create a bus client that sends `Authorization: Bearer <token>` to the bridge
    pub fn with_auth(url: &str, auth_token: Option<&str>) -> BackendResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = auth_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| BackendError::InvalidRequest(format!("Invalid auth token: {}", e)))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create client: {}", e)))?;

        let url = Url::parse(url)
            .map_err(|e| BackendError::InvalidRequest(format!("Invalid bus URL '{}': {}", url, e)))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request(&self, method: &str, params: Value, timeout: Duration) -> BackendResult<Value> {
        let id = Uuid::new_v4().to_string();
        let body = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: &id,
            method,
            params,
        };

        let response = self
            .client
            .post(self.url.clone())
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Transport(format!(
                "Bus bridge returned HTTP {}",
                status
            )));
        }

        let reply: RpcResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Protocol(format!("Invalid JSON-RPC response: {}", e)))?;

        if let Some(reply_id) = &reply.id {
            if *reply_id != json!(id) {
                return Err(BackendError::Protocol(format!(
                    "Response id {} does not match request id {}",
                    reply_id, id
                )));
            }
        }

        if let Some(error) = reply.error {
            debug!(code = error.code, message = %error.message, "Remote call failed");
            return Err(BackendError::Remote {
                code: Some(error.code),
                message: error.message,
            });
        }

        Ok(reply.result.unwrap_or(Value::Null))
    }

    fn map_send_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.url.to_string())
        } else {
            BackendError::Transport(format!("Bus bridge unreachable: {}", err))
        }
    }
}

#[async_trait]
impl BackendClient for JsonRpcBus {
    #[instrument(skip(self))]
    async fn list_peers(&self, timeout: Duration) -> BackendResult<Vec<String>> {
        let result = self.request(PEERLIST_METHOD, json!({}), timeout).await?;
        serde_json::from_value(result)
            .map_err(|e| BackendError::Protocol(format!("Unexpected peer list: {}", e)))
    }

    #[instrument(skip(self, args))]
    async fn call(
        &self,
        target: &str,
        method: &str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> BackendResult<Value> {
        let params = json!({
            "peer": target,
            "method": method,
            "args": args,
        });
        self.request(CALL_METHOD, params, timeout).await
    }
}
