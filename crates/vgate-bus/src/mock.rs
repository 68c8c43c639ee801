//! In-memory bus for testing and demos
//!
//! Emulates one connection agent per platform (`{name}.platform.agent`)
//! answering `get_devices`, `list_agents` and `route_to_agent_method`, with
//! a device driver behind it serving `get_point`, `set_point` and
//! `scrape_all` from an in-memory point table.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Map, Value};
use uuid::Uuid;
use vgate_core::backend::methods;
use vgate_core::routing::{self, CompositeTarget, DEFAULT_DRIVER_IDENTITY};
use vgate_core::{AgentDescriptor, BackendClient, BackendError, BackendResult};

/// A call received by the mock bus
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub target: String,
    pub method: String,
    pub args: Vec<Value>,
}

/// One emulated platform
#[derive(Debug, Clone)]
pub struct MockPlatform {
    name: String,
    agents: Vec<AgentDescriptor>,
    /// Driver device path → point name → value
    devices: BTreeMap<String, BTreeMap<String, Value>>,
}

impl MockPlatform {
    /// Platform with a driver agent and no devices
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agents: vec![AgentDescriptor::new(
                DEFAULT_DRIVER_IDENTITY,
                Uuid::new_v4().to_string(),
            )],
            devices: BTreeMap::new(),
        }
    }

    /// Pin the driver agent's uuid
    pub fn with_driver_uuid(self, uuid: impl Into<String>) -> Self {
        self.without_driver()
            .with_agent(DEFAULT_DRIVER_IDENTITY, uuid)
    }

    /// Remove the driver agent
    pub fn without_driver(mut self) -> Self {
        self.agents
            .retain(|agent| agent.identity != DEFAULT_DRIVER_IDENTITY);
        self
    }

    /// Register an additional agent
    pub fn with_agent(mut self, identity: impl Into<String>, uuid: impl Into<String>) -> Self {
        self.agents.push(AgentDescriptor::new(identity, uuid));
        self
    }

    /// Add a point to a device, creating the device if needed
    pub fn with_point(
        mut self,
        device: impl Into<String>,
        point: impl Into<String>,
        value: Value,
    ) -> Self {
        self.devices
            .entry(device.into())
            .or_default()
            .insert(point.into(), value);
        self
    }

    /// Bus identity of this platform's connection agent
    pub fn connection_id(&self) -> String {
        routing::controller_connection(&self.name)
    }

    pub fn driver_uuid(&self) -> Option<&str> {
        self.agents
            .iter()
            .find(|agent| agent.identity == DEFAULT_DRIVER_IDENTITY)
            .map(|agent| agent.uuid.as_str())
    }

    /// Device listing in the shape platforms report it: topics carry a
    /// leading `devices/` segment.
    fn device_listing(&self) -> Value {
        let now = Utc::now().to_rfc3339();
        let listing: Map<String, Value> = self
            .devices
            .iter()
            .map(|(device, points)| {
                let metadata = json!({
                    "points": points.keys().collect::<Vec<_>>(),
                    "health": {
                        "status": "GOOD",
                        "context": format!("Last received data on: {}", now),
                        "last_updated": now,
                    },
                    "last_publish_utc": now,
                });
                (format!("devices/{}", device), metadata)
            })
            .collect();
        Value::Object(listing)
    }

    fn route_to_agent(&mut self, args: &[Value]) -> BackendResult<Value> {
        let target: CompositeTarget = str_arg(args, 1, "target")?.parse()?;
        let forwarded = match args.get(2) {
            Some(Value::Array(inner)) => inner.as_slice(),
            _ => return Err(BackendError::remote("route_to_agent_method expects an argument list")),
        };

        if target.platform != self.name {
            return Err(BackendError::remote(format!(
                "Target platform '{}' is not '{}'",
                target.platform, self.name
            )));
        }
        if !self.agents.iter().any(|agent| agent.uuid == target.agent_uuid) {
            return Err(BackendError::remote(format!(
                "No agent with uuid '{}'",
                target.agent_uuid
            )));
        }

        match target.operation.as_str() {
            methods::GET_POINT => {
                let points = self.device(str_arg(forwarded, 0, "device")?)?;
                let point = str_arg(forwarded, 1, "point")?;
                points
                    .get(point)
                    .cloned()
                    .ok_or_else(|| BackendError::remote(format!("Point not found: {}", point)))
            }
            methods::SET_POINT => {
                let device = str_arg(forwarded, 0, "device")?.to_string();
                let point = str_arg(forwarded, 1, "point")?.to_string();
                let value = forwarded
                    .get(2)
                    .cloned()
                    .ok_or_else(|| BackendError::remote("set_point requires a value"))?;
                let points = self
                    .devices
                    .get_mut(&device)
                    .ok_or_else(|| BackendError::remote(format!("Device not found: {}", device)))?;
                let slot = points
                    .get_mut(&point)
                    .ok_or_else(|| BackendError::remote(format!("Point not found: {}", point)))?;
                *slot = value.clone();
                Ok(value)
            }
            methods::SCRAPE_ALL => {
                let points = self.device(str_arg(forwarded, 0, "device")?)?;
                Ok(Value::Object(
                    points.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                ))
            }
            other => Err(BackendError::remote(format!("Method not found: {}", other))),
        }
    }

    fn device(&self, device: &str) -> BackendResult<&BTreeMap<String, Value>> {
        self.devices
            .get(device)
            .ok_or_else(|| BackendError::remote(format!("Device not found: {}", device)))
    }
}

/// In-memory bus
#[derive(Debug, Default)]
pub struct MockBus {
    platforms: RwLock<Vec<MockPlatform>>,
    /// Peers that are not platform connections
    other_peers: Vec<String>,
    latency: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two platforms with a handful of HVAC devices, used when the gateway
    /// runs without a real bus
    pub fn demo() -> Self {
        let north = MockPlatform::new("volttron1")
            .with_point("campus/building1/ahu1", "Temperature", json!(72.5))
            .with_point("campus/building1/ahu1", "Setpoint", json!(70))
            .with_point("campus/building1/ahu1", "SupplyFanOn", json!(true))
            .with_point("campus/building1/ahu1", "Mode", json!("cool"))
            .with_point("campus/building1/rtu2", "Temperature", json!(68.0))
            .with_point("campus/building1/rtu2", "DamperPosition", json!(35));
        let south = MockPlatform::new("volttron2")
            .with_point("campus/building2/meter", "PowerKw", json!(142.7))
            .with_point("campus/building2/meter", "Online", json!(true));

        Self::new()
            .with_platform(north)
            .with_platform(south)
            .with_peer("pubsub")
            .with_peer("config.store")
    }

    pub fn with_platform(mut self, platform: MockPlatform) -> Self {
        self.platforms.get_mut().push(platform);
        self
    }

    /// Add a connected peer that is not a platform connection
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.other_peers.push(peer.into());
        self
    }

    /// Delay every answer by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every call received so far, oldest first
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl BackendClient for MockBus {
    async fn list_peers(&self, _timeout: Duration) -> BackendResult<Vec<String>> {
        self.delay().await;
        let mut peers: Vec<String> = self
            .platforms
            .read()
            .iter()
            .map(MockPlatform::connection_id)
            .collect();
        peers.extend(self.other_peers.iter().cloned());
        Ok(peers)
    }

    async fn call(
        &self,
        target: &str,
        method: &str,
        args: Vec<Value>,
        _timeout: Duration,
    ) -> BackendResult<Value> {
        self.calls.lock().push(RecordedCall {
            target: target.to_string(),
            method: method.to_string(),
            args: args.clone(),
        });
        self.delay().await;

        let mut platforms = self.platforms.write();
        let platform = platforms
            .iter_mut()
            .find(|platform| platform.connection_id() == target)
            .ok_or_else(|| BackendError::Transport(format!("Peer not connected: {}", target)))?;

        match method {
            methods::GET_DEVICES => Ok(platform.device_listing()),
            methods::LIST_AGENTS => serde_json::to_value(&platform.agents)
                .map_err(|e| BackendError::Protocol(e.to_string())),
            methods::ROUTE_TO_AGENT_METHOD => platform.route_to_agent(&args),
            other => Err(BackendError::remote(format!("Method not found: {}", other))),
        }
    }
}

fn str_arg<'a>(args: &'a [Value], index: usize, name: &str) -> BackendResult<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::remote(format!("Missing string argument '{}'", name)))
}
