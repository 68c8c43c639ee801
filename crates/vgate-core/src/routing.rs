//! Naming and routing helpers.
//!
//! Platforms are reached through a connection agent whose peer identity
//! follows a naming convention, and operations on a platform's agents are
//! addressed with a composite target string. Device requests arrive as
//! slash-delimited paths that have to be split back into platform, device
//! and point. These helpers centralise that logic so every call site behaves
//! identically.

use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;

use crate::error::{BackendError, BackendResult};

/// Prefix used by platform connection agents on some deployments
pub const PLATFORM_CONNECTION_PREFIX: &str = "vcp-";

/// Suffix of a platform connection agent's identity
pub const PLATFORM_CONNECTION_SUFFIX: &str = ".platform.agent";

/// Identity of the controller agent on every platform
pub const PLATFORM_AGENT: &str = "platform.agent";

/// Default identity of the agent that owns device points
pub const DEFAULT_DRIVER_IDENTITY: &str = "platform.driver";

/// Last path segment selecting a full scrape of a device
pub const SCRAPE_ALL_SEGMENT: &str = "all";

/// Second-to-last path segment marking a point access
pub const POINT_SEGMENT: &str = "pt";

/// Whether a bus peer identity names a platform connection.
///
/// ```
/// # use vgate_core::routing::is_platform_connection;
/// assert!(is_platform_connection("volttron1.platform.agent"));
/// assert!(is_platform_connection("vcp-building7"));
/// assert!(!is_platform_connection("platform.driver"));
/// ```
pub fn is_platform_connection(peer: &str) -> bool {
    peer.starts_with(PLATFORM_CONNECTION_PREFIX) || peer.ends_with(PLATFORM_CONNECTION_SUFFIX)
}

/// Short platform name of a connection identity: everything before the first `.`.
///
/// ```
/// # use vgate_core::routing::platform_name;
/// assert_eq!(platform_name("volttron1.platform.agent"), "volttron1");
/// assert_eq!(platform_name("vcp-building7"), "vcp-building7");
/// ```
pub fn platform_name(connection: &str) -> &str {
    connection
        .split_once('.')
        .map(|(name, _)| name)
        .unwrap_or(connection)
}

/// Peer identity of the controller connection for a platform.
///
/// ```
/// # use vgate_core::routing::controller_connection;
/// assert_eq!(controller_connection("volttron1"), "volttron1.platform.agent");
/// ```
pub fn controller_connection(platform: &str) -> String {
    format!("{}.{}", platform, PLATFORM_AGENT)
}

/// Public link to a device's index, as served by the gateway.
///
/// Device topics reported by platforms usually carry a leading `devices`
/// segment; it is dropped because the link already lives under `/devices`.
///
/// ```
/// # use vgate_core::routing::device_link;
/// assert_eq!(
///     device_link("volttron1", "devices/campus/bldg/dev"),
///     "/devices/volttron1/campus/bldg/dev"
/// );
/// assert_eq!(device_link("volttron1", "campus/dev"), "/devices/volttron1/campus/dev");
/// ```
pub fn device_link(platform: &str, device: &str) -> String {
    let local = device.strip_prefix("devices").unwrap_or(device);
    format!("/devices/{}/{}", platform, local.trim_start_matches('/'))
}

/// Public link to a sub-resource of a device (e.g. `all`)
pub fn device_resource_link(platform: &str, device: &str, resource: &str) -> String {
    format!("/devices/{}/{}/{}", platform, device, resource)
}

/// Address of an operation on a specific agent of a platform:
/// `"{platform}.uuid.{agent_uuid}.{operation}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeTarget {
    pub platform: String,
    pub agent_uuid: String,
    pub operation: String,
}

impl CompositeTarget {
    pub fn new(
        platform: impl Into<String>,
        agent_uuid: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            agent_uuid: agent_uuid.into(),
            operation: operation.into(),
        }
    }
}

impl fmt::Display for CompositeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.uuid.{}.{}",
            self.platform, self.agent_uuid, self.operation
        )
    }
}

impl FromStr for CompositeTarget {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BackendError::InvalidRequest(format!("Malformed agent target: '{}'", s));

        let (platform, rest) = s.split_once(".uuid.").ok_or_else(invalid)?;
        let (agent_uuid, operation) = rest.rsplit_once('.').ok_or_else(invalid)?;
        if platform.is_empty() || agent_uuid.is_empty() || operation.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(platform, agent_uuid, operation))
    }
}

/// Device request decoded from a `/<prefix>/<platform>/<rest...>` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRoute {
    /// `/<prefix>/<platform>/<device...>`
    Index { platform: String, device: String },
    /// `/<prefix>/<platform>/<device...>/all`
    ScrapeAll { platform: String, device: String },
    /// `/<prefix>/<platform>/<device...>/pt/<point>`
    Point {
        platform: String,
        device: String,
        point: String,
    },
}

impl DeviceRoute {
    /// Decode a request path.
    ///
    /// The prefix segment is not inspected; matching it is the router's job.
    /// A single trailing `/` is ignored, except after `pt` where it leaves the
    /// point name empty. Segments are percent-decoded after splitting.
    ///
    /// ```
    /// # use vgate_core::routing::DeviceRoute;
    /// let route = DeviceRoute::parse("/devices/plat1/campus/bldg/dev/pt/Temperature").unwrap();
    /// assert_eq!(
    ///     route,
    ///     DeviceRoute::Point {
    ///         platform: "plat1".into(),
    ///         device: "campus/bldg/dev".into(),
    ///         point: "Temperature".into(),
    ///     }
    /// );
    /// ```
    pub fn parse(path: &str) -> BackendResult<Self> {
        // The leading slash yields an empty first element
        let mut raw: Vec<&str> = path.split('/').skip(1).collect();
        if raw.len() > 1 && raw.last() == Some(&"") {
            raw.pop();
            if raw.len() > 2 && raw.last() == Some(&POINT_SEGMENT) {
                return Err(BackendError::InvalidRequest(format!(
                    "Missing point name in path: '{}'",
                    path
                )));
            }
        }
        let segments = raw
            .iter()
            .map(|segment| decode_segment(segment, path))
            .collect::<BackendResult<Vec<String>>>()?;

        let platform = match segments.get(1) {
            Some(p) if !p.is_empty() => p.clone(),
            _ => {
                return Err(BackendError::InvalidRequest(format!(
                    "Missing platform in device path: '{}'",
                    path
                )))
            }
        };
        let rest = &segments[2..];

        let route = match rest {
            [device @ .., last] if *last == SCRAPE_ALL_SEGMENT => DeviceRoute::ScrapeAll {
                platform,
                device: device.join("/"),
            },
            [device @ .., marker, point] if *marker == POINT_SEGMENT => {
                if point.is_empty() {
                    return Err(BackendError::InvalidRequest(format!(
                        "Missing point name in path: '{}'",
                        path
                    )));
                }
                DeviceRoute::Point {
                    platform,
                    device: device.join("/"),
                    point: point.clone(),
                }
            }
            device => DeviceRoute::Index {
                platform,
                device: device.join("/"),
            },
        };

        if route.device().is_empty() {
            return Err(BackendError::InvalidRequest(format!(
                "Missing device in path: '{}'",
                path
            )));
        }

        Ok(route)
    }

    pub fn platform(&self) -> &str {
        match self {
            DeviceRoute::Index { platform, .. }
            | DeviceRoute::ScrapeAll { platform, .. }
            | DeviceRoute::Point { platform, .. } => platform,
        }
    }

    pub fn device(&self) -> &str {
        match self {
            DeviceRoute::Index { device, .. }
            | DeviceRoute::ScrapeAll { device, .. }
            | DeviceRoute::Point { device, .. } => device,
        }
    }
}

fn decode_segment(segment: &str, path: &str) -> BackendResult<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| {
            BackendError::InvalidRequest(format!("Path is not valid UTF-8: '{}'", path))
        })
}
