//! vgate-platform - Platform resolution and device access over the bus
//!
//! The gateway fronts any number of platforms, each reachable through one
//! connection agent on the message bus. This crate turns the gateway's
//! logical view (platform names, device paths, point names) into concrete
//! bus calls.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         vgate-api                            │
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │                              │
//!                 ▼                              ▼
//!   ┌───────────────────────────┐   ┌───────────────────────────┐
//!   │       DeviceProxy         │──▶│     PlatformResolver      │
//!   │  get/set point, scrape,   │   │  peer discovery, device   │
//!   │  device index             │   │  hierarchy, agent uuids   │
//!   └───────────────────────────┘   └─────────────┬─────────────┘
//!                                                 │
//!                                                 ▼
//!                                   ┌───────────────────────────┐
//!                                   │  dyn BackendClient (bus)  │
//!                                   └───────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use vgate_platform::{DeviceProxy, PlatformResolver};
//!
//! let resolver = Arc::new(PlatformResolver::new(bus));
//! let devices = DeviceProxy::new(resolver.clone());
//!
//! let hierarchy = resolver.devices_hierarchy().await?;
//! let temp = devices.get_point("volttron1", "campus/bldg/ahu1", "Temperature").await?;
//! ```

mod proxy;
mod resolver;

pub use proxy::DeviceProxy;
pub use resolver::{CallTimeouts, PlatformResolver};

// Re-export core types for convenience
pub use vgate_core::{BackendClient, BackendError, BackendResult};
