//! Platform Resolver - discovers platforms and resolves their agents
//!
//! Every platform is reachable through exactly one connection agent on the
//! bus. Nothing is cached: connections, device lists and agent uuids are
//! fetched fresh for every request, so the view always matches what is
//! currently connected.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, warn};
use vgate_core::backend::methods;
use vgate_core::routing;
use vgate_core::{
    AgentDescriptor, BackendClient, BackendError, BackendResult, DeviceEntry, DeviceMap,
    DevicesHierarchy,
};

/// Default bound on peer listing
const DEFAULT_PEER_LIST_TIMEOUT: Duration = Duration::from_secs(5);
/// Default bound on every other bus call
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bounds on bus calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeouts {
    /// Bound on listing connected peers
    pub peer_list: Duration,
    /// Bound on every other call
    pub call: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            peer_list: DEFAULT_PEER_LIST_TIMEOUT,
            call: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Maps platform names and agent identities to bus call targets
pub struct PlatformResolver {
    client: Arc<dyn BackendClient>,
    timeouts: CallTimeouts,
}

impl PlatformResolver {
    /// Create a resolver with the default timeouts
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self::with_timeouts(client, CallTimeouts::default())
    }

    /// Create a resolver with custom timeouts
    pub fn with_timeouts(client: Arc<dyn BackendClient>, timeouts: CallTimeouts) -> Self {
        Self { client, timeouts }
    }

    pub fn timeouts(&self) -> CallTimeouts {
        self.timeouts
    }

    /// Call `method` on the peer `target`, bounded by the call timeout.
    ///
    /// Failures are returned as-is; there is no retry.
    pub async fn call(&self, target: &str, method: &str, args: Vec<Value>) -> BackendResult<Value> {
        debug!(peer = %target, method = %method, "Calling backend");
        let limit = self.timeouts.call;
        bounded(
            limit,
            &format!("{}.{}", target, method),
            self.client.call(target, method, args, limit),
        )
        .await
    }

    /// Identities of the platform connections currently on the bus
    pub async fn list_platform_connections(&self) -> BackendResult<Vec<String>> {
        let limit = self.timeouts.peer_list;
        let peers = bounded(limit, "peerlist", self.client.list_peers(limit)).await?;

        let mut connections: Vec<String> = peers
            .into_iter()
            .filter(|peer| routing::is_platform_connection(peer))
            .collect();
        connections.sort();
        connections.dedup();

        debug!(count = connections.len(), "Found platform connections");
        Ok(connections)
    }

    /// Devices of every connected platform, keyed by platform name.
    ///
    /// One `get_devices` call is issued per platform, concurrently. If any of
    /// them fails the whole aggregation fails.
    pub async fn devices_hierarchy(&self) -> BackendResult<DevicesHierarchy> {
        let connections = self.list_platform_connections().await?;

        let calls = connections.iter().map(|connection| async move {
            let result = self.call(connection, methods::GET_DEVICES, Vec::new()).await?;
            let devices = parse_devices(connection, result)?;
            Ok::<_, BackendError>((routing::platform_name(connection).to_string(), devices))
        });

        Ok(try_join_all(calls).await?.into_iter().collect())
    }

    /// Names of the connected platforms.
    ///
    /// Values are unit so the map serializes as `{name: null, ...}`.
    pub async fn platforms_list(&self) -> BackendResult<BTreeMap<String, ()>> {
        Ok(self
            .devices_hierarchy()
            .await?
            .into_keys()
            .map(|name| (name, ()))
            .collect())
    }

    /// Flattened device listing: device topic → platform and gateway link.
    ///
    /// Device topics are not qualified by platform; when two platforms report
    /// the same topic, the platform that sorts last wins.
    pub async fn devices_list(&self) -> BackendResult<BTreeMap<String, DeviceEntry>> {
        let mut listing = BTreeMap::new();
        for (platform, devices) in self.devices_hierarchy().await? {
            for device in devices.into_keys() {
                let link = routing::device_link(&platform, &device);
                listing.insert(
                    device,
                    DeviceEntry {
                        platform: platform.clone(),
                        link,
                    },
                );
            }
        }
        Ok(listing)
    }

    /// Uuid of the agent registered as `identity` on `platform`
    pub async fn resolve_agent_uuid(&self, platform: &str, identity: &str) -> BackendResult<String> {
        let connection = routing::controller_connection(platform);
        let result = self
            .call(&connection, methods::LIST_AGENTS, Vec::new())
            .await?;

        let agents: Vec<AgentDescriptor> = serde_json::from_value(result).map_err(|e| {
            BackendError::Protocol(format!("Unexpected agent list from {}: {}", connection, e))
        })?;

        agents
            .into_iter()
            .find(|agent| agent.identity == identity)
            .map(|agent| agent.uuid)
            .ok_or_else(|| BackendError::AgentNotFound {
                platform: platform.to_string(),
                identity: identity.to_string(),
            })
    }
}

/// Run `call`, failing with `Timeout` once `limit` has elapsed
async fn bounded<T, F>(limit: Duration, target: &str, call: F) -> BackendResult<T>
where
    F: Future<Output = BackendResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(peer = %target, ?limit, "Backend call timed out");
            Err(BackendError::Timeout(target.to_string()))
        }
    }
}

fn parse_devices(connection: &str, result: Value) -> BackendResult<DeviceMap> {
    serde_json::from_value(result).map_err(|e| {
        BackendError::Protocol(format!("Unexpected device list from {}: {}", connection, e))
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use vgate_bus::{MockBus, MockPlatform};

    use super::*;

    fn resolver(bus: MockBus) -> PlatformResolver {
        PlatformResolver::new(Arc::new(bus))
    }

    /// Bus whose platform `south` always fails
    struct PartiallyBrokenBus;

    #[async_trait]
    impl BackendClient for PartiallyBrokenBus {
        async fn list_peers(&self, _timeout: Duration) -> BackendResult<Vec<String>> {
            Ok(vec![
                "north.platform.agent".to_string(),
                "south.platform.agent".to_string(),
            ])
        }

        async fn call(
            &self,
            target: &str,
            _method: &str,
            _args: Vec<Value>,
            _timeout: Duration,
        ) -> BackendResult<Value> {
            if target.starts_with("south") {
                Err(BackendError::remote("driver crashed"))
            } else {
                Ok(json!({"devices/campus/dev": {}}))
            }
        }
    }

    /// Bus that never answers
    struct SilentBus;

    #[async_trait]
    impl BackendClient for SilentBus {
        async fn list_peers(&self, _timeout: Duration) -> BackendResult<Vec<String>> {
            futures::future::pending().await
        }

        async fn call(
            &self,
            _target: &str,
            _method: &str,
            _args: Vec<Value>,
            _timeout: Duration,
        ) -> BackendResult<Value> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn filters_platform_connections() {
        let bus = MockBus::new()
            .with_platform(MockPlatform::new("north"))
            .with_peer("vcp-south")
            .with_peer("pubsub")
            .with_peer("platform.driver");

        let connections = resolver(bus).list_platform_connections().await.unwrap();
        assert_eq!(connections, vec!["north.platform.agent", "vcp-south"]);
    }

    #[tokio::test]
    async fn builds_hierarchy_per_platform() {
        let bus = MockBus::new()
            .with_platform(MockPlatform::new("north").with_point("campus/ahu1", "Temp", json!(70)))
            .with_platform(MockPlatform::new("south").with_point("campus/rtu2", "Fan", json!(true)));

        let hierarchy = resolver(bus).devices_hierarchy().await.unwrap();

        assert_eq!(hierarchy.keys().collect::<Vec<_>>(), vec!["north", "south"]);
        assert!(hierarchy["north"].contains_key("devices/campus/ahu1"));
        assert!(hierarchy["south"].contains_key("devices/campus/rtu2"));
    }

    #[tokio::test]
    async fn hierarchy_fails_when_one_platform_fails() {
        let resolver = PlatformResolver::new(Arc::new(PartiallyBrokenBus));
        let err = resolver.devices_hierarchy().await.unwrap_err();
        assert!(matches!(err, BackendError::Remote { .. }));
    }

    #[tokio::test]
    async fn platforms_and_devices_lists() {
        let bus = MockBus::new()
            .with_platform(MockPlatform::new("north").with_point("campus/ahu1", "Temp", json!(70)));
        let resolver = resolver(bus);

        let platforms = resolver.platforms_list().await.unwrap();
        assert_eq!(serde_json::to_value(&platforms).unwrap(), json!({"north": null}));

        let devices = resolver.devices_list().await.unwrap();
        assert_eq!(
            devices["devices/campus/ahu1"],
            DeviceEntry {
                platform: "north".to_string(),
                link: "/devices/north/campus/ahu1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn resolves_agent_uuid() {
        let platform = MockPlatform::new("north").with_agent("weather", "uuid-weather");
        let bus = MockBus::new().with_platform(platform);

        let uuid = resolver(bus)
            .resolve_agent_uuid("north", "weather")
            .await
            .unwrap();
        assert_eq!(uuid, "uuid-weather");
    }

    #[tokio::test]
    async fn missing_agent_is_not_found() {
        let bus = MockBus::new().with_platform(MockPlatform::new("north").with_agent("weather", "u1"));

        let err = resolver(bus)
            .resolve_agent_uuid("north", "historian")
            .await
            .unwrap_err();
        match err {
            BackendError::AgentNotFound { platform, identity } => {
                assert_eq!(platform, "north");
                assert_eq!(identity, "historian");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn silent_backend_times_out() {
        let resolver = PlatformResolver::with_timeouts(
            Arc::new(SilentBus),
            CallTimeouts {
                peer_list: Duration::from_secs(5),
                call: Duration::from_secs(10),
            },
        );

        let err = resolver.list_platform_connections().await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout(ref t) if t == "peerlist"));

        let err = resolver
            .resolve_agent_uuid("north", "platform.driver")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout(_)));
    }

    #[tokio::test]
    async fn null_device_list_is_protocol_error() {
        struct NullDevicesBus;

        #[async_trait]
        impl BackendClient for NullDevicesBus {
            async fn list_peers(&self, _timeout: Duration) -> BackendResult<Vec<String>> {
                Ok(vec!["north.platform.agent".to_string()])
            }

            async fn call(
                &self,
                _target: &str,
                _method: &str,
                _args: Vec<Value>,
                _timeout: Duration,
            ) -> BackendResult<Value> {
                Ok(Value::Null)
            }
        }

        let resolver = PlatformResolver::new(Arc::new(NullDevicesBus));
        assert_eq!(resolver.timeouts(), CallTimeouts::default());

        let err = resolver.devices_hierarchy().await.unwrap_err();
        assert!(matches!(err, BackendError::Protocol(ref msg) if msg.contains("north.platform.agent")));
    }

    #[tokio::test]
    async fn malformed_agent_list_is_protocol_error() {
        struct OddBus;

        #[async_trait]
        impl BackendClient for OddBus {
            async fn list_peers(&self, _timeout: Duration) -> BackendResult<Vec<String>> {
                Ok(Vec::new())
            }

            async fn call(
                &self,
                _target: &str,
                _method: &str,
                _args: Vec<Value>,
                _timeout: Duration,
            ) -> BackendResult<Value> {
                Ok(json!("not a list"))
            }
        }

        let err = PlatformResolver::new(Arc::new(OddBus))
            .resolve_agent_uuid("north", "platform.driver")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Protocol(_)));
    }
}
