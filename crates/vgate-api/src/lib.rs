//! vgate-api - HTTP API layer of the platform gateway
//!
//! Requests are not routed by axum itself: a single fallback handler hands
//! every request to the [`Dispatcher`], which answers CORS preflights, looks
//! the path up in the [`RouteRegistry`] and formats whatever the handler
//! returns.
//!
//! # Usage
//!
//! ```ignore
//! use vgate_api::{build_routes, create_router, AppState, Dispatcher};
//! use vgate_bus::MockBus;
//!
//! let state = AppState::new(Arc::new(MockBus::demo()));
//! let router = create_router(Dispatcher::new(state, build_routes()?));
//! ```

pub mod auth;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod response;
pub mod state;

pub use auth::{check_authorization, CredentialVerifier};
pub use dispatch::{ApiRequest, Dispatcher};
pub use error::ApiError;
pub use registry::{handler, Handler, RegistryError, RouteRegistry};
pub use response::{format_response, ApiResponse, ResponseKind};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Register every gateway endpoint
pub fn build_routes() -> Result<RouteRegistry, RegistryError> {
    let mut routes = RouteRegistry::new();

    // Health check
    routes.register_exact("/health", handler(handlers::health));
    // Tokens
    routes.register_exact("/auth", handler(handlers::auth::handle_auth));
    // Platform and device listings
    routes.register_exact("/platforms", handler(handlers::platforms::platforms_list));
    routes.register_exact("/devices", handler(handlers::devices::devices_list));
    routes.register_exact(
        "/devices/hierarchy",
        handler(handlers::devices::devices_hierarchy),
    );
    // Device index, scrape and point access
    routes.register_pattern(r"/devices/.*", handler(handlers::devices::device_or_point))?;

    Ok(routes)
}

/// Create the axum router serving `dispatcher`
pub fn create_router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .fallback(dispatch::serve)
        .with_state(Arc::new(dispatcher))
        .layer(TraceLayer::new_for_http())
}

/// Router with the standard endpoints over `state`
pub fn router(state: AppState) -> Result<Router, RegistryError> {
    Ok(create_router(Dispatcher::new(state, build_routes()?)))
}
