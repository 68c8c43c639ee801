//! Device models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Device topic → metadata, as reported by one platform's `get_devices`
pub type DeviceMap = BTreeMap<String, Value>;

/// Platform name → devices on that platform
pub type DevicesHierarchy = BTreeMap<String, DeviceMap>;

/// Entry of the flattened device listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Platform the device lives on
    pub platform: String,
    /// Gateway link to the device's index
    pub link: String,
}

/// Directory of the sub-resources available for a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIndex {
    /// Resource name → gateway link
    pub links: BTreeMap<String, String>,
}
