//! Agent models

use serde::{Deserialize, Serialize};

/// An agent registered on a platform, as reported by `list_agents`.
///
/// Platforms report more fields than these; everything else is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Bus identity of the agent (e.g. "platform.driver")
    pub identity: String,
    /// Installation uuid used to address the agent through its platform
    pub uuid: String,
}

impl AgentDescriptor {
    pub fn new(identity: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            uuid: uuid.into(),
        }
    }
}
