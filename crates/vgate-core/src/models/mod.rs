//! Shared data models for the gateway

mod agent;
mod device;
mod point;

pub use agent::*;
pub use device::*;
pub use point::*;
