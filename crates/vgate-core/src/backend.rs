//! BackendClient trait - the gateway's only way onto the message bus

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendResult;

/// Remote methods the gateway invokes over the bus
pub mod methods {
    /// Platform connection: device topics and their metadata
    pub const GET_DEVICES: &str = "get_devices";
    /// Platform connection: agents installed on the platform
    pub const LIST_AGENTS: &str = "list_agents";
    /// Platform connection: forward a call to one of the platform's agents
    pub const ROUTE_TO_AGENT_METHOD: &str = "route_to_agent_method";

    /// Driver agent: read one point
    pub const GET_POINT: &str = "get_point";
    /// Driver agent: write one point
    pub const SET_POINT: &str = "set_point";
    /// Driver agent: read every point of a device
    pub const SCRAPE_ALL: &str = "scrape_all";
}

/// The capability the gateway needs from the message bus.
///
/// Implementations wrap a concrete transport:
/// - `JsonRpcBus` - an HTTP JSON-RPC bridge onto the bus
/// - `MockBus` - an in-memory bus for tests and demos
///
/// The resolver enforces its own bound on every call, so `timeout` is a hint
/// that implementations should pass on to their transport where possible.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// List the identities of every peer currently connected to the bus
    async fn list_peers(&self, timeout: Duration) -> BackendResult<Vec<String>>;

    /// Invoke `method` on the peer `target` with positional `args`
    async fn call(
        &self,
        target: &str,
        method: &str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> BackendResult<Value>;
}
