//! vgate-bus - Message bus adapters
//!
//! Implementations of [`BackendClient`](vgate_core::BackendClient):
//!
//! - [`JsonRpcBus`] reaches the bus through an HTTP JSON-RPC 2.0 bridge.
//! - [`MockBus`] emulates platform connections and their device drivers in
//!   memory, for tests and for running the gateway without a bus.

mod jsonrpc;
mod mock;

pub use jsonrpc::JsonRpcBus;
pub use mock::{MockBus, MockPlatform, RecordedCall};
