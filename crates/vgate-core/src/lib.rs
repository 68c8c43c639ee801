//! vgate-core - Core traits and types for the vgate platform gateway
//!
//! This crate provides the abstractions shared by every layer of the gateway:
//! the [`BackendClient`] trait through which the message bus is reached, the
//! naming conventions that turn platform names into call targets, the
//! in-memory [`TokenStore`], and the data models returned to HTTP clients.

pub mod backend;
pub mod error;
pub mod models;
pub mod routing;
pub mod token;

pub use backend::BackendClient;
pub use error::{BackendError, BackendResult};
pub use models::*;
pub use token::{Credentials, TokenStore};
