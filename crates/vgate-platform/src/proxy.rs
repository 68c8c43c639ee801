//! Device RPC Proxy - point reads/writes through a platform's driver agent
//!
//! Operations on a device are forwarded by the platform's controller
//! connection to the driver agent, addressed by its installation uuid:
//!
//! ```text
//! gateway ──route_to_agent_method(request_id, "north.uuid.<uuid>.get_point", [device, point])──▶ north.platform.agent ──▶ driver
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;
use vgate_core::backend::methods;
use vgate_core::routing::{self, CompositeTarget, DEFAULT_DRIVER_IDENTITY, SCRAPE_ALL_SEGMENT};
use vgate_core::{BackendResult, DeviceIndex};

use crate::resolver::PlatformResolver;

/// Sub-resources listed in a device index
const DEVICE_RESOURCES: &[&str] = &[SCRAPE_ALL_SEGMENT];

/// Reads and writes device points on remote platforms
pub struct DeviceProxy {
    resolver: Arc<PlatformResolver>,
    /// Identity of the agent that owns device points on every platform
    driver_identity: String,
}

impl DeviceProxy {
    pub fn new(resolver: Arc<PlatformResolver>) -> Self {
        Self {
            resolver,
            driver_identity: DEFAULT_DRIVER_IDENTITY.to_string(),
        }
    }

    /// Address a different driver agent identity
    pub fn with_driver_identity(mut self, identity: impl Into<String>) -> Self {
        self.driver_identity = identity.into();
        self
    }

    pub fn resolver(&self) -> &Arc<PlatformResolver> {
        &self.resolver
    }

    pub fn driver_identity(&self) -> &str {
        &self.driver_identity
    }

    /// Current value of one point
    pub async fn get_point(&self, platform: &str, device: &str, point: &str) -> BackendResult<Value> {
        self.call_driver(platform, methods::GET_POINT, vec![json!(device), json!(point)])
            .await
    }

    /// Write one point. Returns the value the driver confirmed, which may
    /// differ from `value` after coercion.
    pub async fn set_point(
        &self,
        platform: &str,
        device: &str,
        point: &str,
        value: Value,
    ) -> BackendResult<Value> {
        self.call_driver(
            platform,
            methods::SET_POINT,
            vec![json!(device), json!(point), value],
        )
        .await
    }

    /// Every point of a device with its current value
    pub async fn scrape_all(&self, platform: &str, device: &str) -> BackendResult<Value> {
        self.call_driver(platform, methods::SCRAPE_ALL, vec![json!(device)])
            .await
    }

    /// Links to the sub-resources of a device.
    ///
    /// The device is scraped first so that unknown devices fail here rather
    /// than on the first follow-up request.
    pub async fn device_index(&self, platform: &str, device: &str) -> BackendResult<DeviceIndex> {
        self.scrape_all(platform, device).await?;

        let links: BTreeMap<String, String> = DEVICE_RESOURCES
            .iter()
            .map(|resource| {
                (
                    resource.to_string(),
                    routing::device_resource_link(platform, device, resource),
                )
            })
            .collect();

        Ok(DeviceIndex { links })
    }

    async fn call_driver(
        &self,
        platform: &str,
        operation: &str,
        args: Vec<Value>,
    ) -> BackendResult<Value> {
        let agent_uuid = self
            .resolver
            .resolve_agent_uuid(platform, &self.driver_identity)
            .await?;
        let target = CompositeTarget::new(platform, agent_uuid, operation);
        let request_id = Uuid::new_v4().to_string();

        debug!(%target, %request_id, "Routing call to driver agent");

        self.resolver
            .call(
                &routing::controller_connection(platform),
                methods::ROUTE_TO_AGENT_METHOD,
                vec![json!(request_id), json!(target.to_string()), Value::Array(args)],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vgate_bus::{MockBus, MockPlatform};
    use vgate_core::BackendError;

    use super::*;

    const DEVICE: &str = "campus/bldg/ahu1";

    fn proxy(platform: MockPlatform) -> (DeviceProxy, Arc<MockBus>) {
        let bus = Arc::new(MockBus::new().with_platform(platform));
        let resolver = Arc::new(PlatformResolver::new(bus.clone()));
        (DeviceProxy::new(resolver), bus)
    }

    fn north() -> MockPlatform {
        MockPlatform::new("north")
            .with_driver_uuid("drv-1")
            .with_point(DEVICE, "Temperature", json!(72.5))
            .with_point(DEVICE, "FanOn", json!(false))
    }

    #[tokio::test]
    async fn get_point_routes_through_controller() {
        let (proxy, bus) = proxy(north());

        let value = proxy.get_point("north", DEVICE, "Temperature").await.unwrap();
        assert_eq!(value, json!(72.5));

        let call = bus
            .recorded_calls()
            .into_iter()
            .find(|c| c.method == methods::ROUTE_TO_AGENT_METHOD)
            .unwrap();
        assert_eq!(call.target, "north.platform.agent");
        assert_eq!(call.args[1], json!("north.uuid.drv-1.get_point"));
        assert_eq!(call.args[2], json!([DEVICE, "Temperature"]));
        assert!(call.args[0].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn set_point_returns_confirmed_value() {
        let (proxy, _bus) = proxy(north());

        let confirmed = proxy
            .set_point("north", DEVICE, "FanOn", json!(true))
            .await
            .unwrap();
        assert_eq!(confirmed, json!(true));

        let value = proxy.get_point("north", DEVICE, "FanOn").await.unwrap();
        assert_eq!(value, json!(true));
    }

    #[tokio::test]
    async fn scrape_all_returns_every_point() {
        let (proxy, _bus) = proxy(north());

        let points = proxy.scrape_all("north", DEVICE).await.unwrap();
        assert_eq!(points, json!({"FanOn": false, "Temperature": 72.5}));
    }

    #[tokio::test]
    async fn device_index_links() {
        let (proxy, _bus) = proxy(north());

        let index = proxy.device_index("north", DEVICE).await.unwrap();
        assert_eq!(
            serde_json::to_value(&index).unwrap(),
            json!({"links": {"all": "/devices/north/campus/bldg/ahu1/all"}})
        );
    }

    #[tokio::test]
    async fn device_index_of_unknown_device_fails() {
        let (proxy, _bus) = proxy(north());

        let err = proxy.device_index("north", "campus/nope").await.unwrap_err();
        assert!(matches!(err, BackendError::Remote { .. }));
    }

    #[tokio::test]
    async fn missing_driver_is_not_found() {
        let (proxy, _bus) = proxy(MockPlatform::new("north").without_driver());

        let err = proxy.get_point("north", DEVICE, "Temperature").await.unwrap_err();
        assert!(matches!(err, BackendError::AgentNotFound { .. }));
    }

    #[tokio::test]
    async fn custom_driver_identity() {
        let platform = north().with_agent("custom.driver", "drv-2");
        let (proxy, bus) = proxy(platform);
        let proxy = proxy.with_driver_identity("custom.driver");

        // The mock forwards by operation, so only the composite target changes
        proxy.get_point("north", DEVICE, "Temperature").await.unwrap();
        let call = bus
            .recorded_calls()
            .into_iter()
            .find(|c| c.method == methods::ROUTE_TO_AGENT_METHOD)
            .unwrap();
        assert_eq!(call.args[1], json!("north.uuid.drv-2.get_point"));
    }
}
