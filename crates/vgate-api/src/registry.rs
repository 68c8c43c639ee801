//! Route registry: exact paths and start-anchored regex patterns
//!
//! Populated once at startup by [`crate::build_routes`] and shared immutably
//! afterwards. Exact paths are looked up first; patterns are tried in
//! registration order and the first match wins.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::dispatch::ApiRequest;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Future returned by a handler
pub type HandlerFuture = BoxFuture<'static, Result<ApiResponse, ApiError>>;

/// Type-erased endpoint handler
pub type Handler = Arc<dyn Fn(AppState, ApiRequest) -> HandlerFuture + Send + Sync>;

/// Wrap an async handler function as a [`Handler`]
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(AppState, ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
{
    Arc::new(move |state, request| -> HandlerFuture { Box::pin(f(state, request)) })
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

struct PatternRoute {
    pattern: String,
    regex: Regex,
    handler: Handler,
}

#[derive(Default)]
pub struct RouteRegistry {
    exact: HashMap<String, Handler>,
    patterns: Vec<PatternRoute>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to exactly `path`. Re-registering a path replaces its handler.
    pub fn register_exact(&mut self, path: impl Into<String>, handler: Handler) {
        let path = path.into();
        info!(%path, "Registered endpoint");
        self.exact.insert(path, handler);
    }

    /// Bind `handler` to every path matching `pattern` from its start.
    ///
    /// Re-registering the same pattern replaces its handler but keeps its
    /// position in the match order.
    pub fn register_pattern(&mut self, pattern: &str, handler: Handler) -> Result<(), RegistryError> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
            RegistryError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        info!(%pattern, "Registered route pattern");
        match self.patterns.iter_mut().find(|route| route.pattern == pattern) {
            Some(existing) => {
                existing.regex = regex;
                existing.handler = handler;
            }
            None => self.patterns.push(PatternRoute {
                pattern: pattern.to_string(),
                regex,
                handler,
            }),
        }
        Ok(())
    }

    /// Handler for `path`: the exact binding if any, else the first matching pattern
    pub fn resolve(&self, path: &str) -> Option<&Handler> {
        self.exact.get(path).or_else(|| {
            self.patterns
                .iter()
                .find(|route| route.regex.is_match(path))
                .map(|route| &route.handler)
        })
    }

    /// Number of registered paths and patterns
    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exact: Vec<&String> = self.exact.keys().collect();
        exact.sort();
        let patterns: Vec<&String> = self.patterns.iter().map(|r| &r.pattern).collect();
        f.debug_struct("RouteRegistry")
            .field("exact", &exact)
            .field("patterns", &patterns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use vgate_bus::MockBus;

    use super::*;

    fn named(name: &'static str) -> Handler {
        handler(move |_state, _request| async move { Ok::<_, ApiError>(ApiResponse::ok(json!(name))) })
    }

    async fn resolved_name(routes: &RouteRegistry, path: &str) -> Option<String> {
        let handler = routes.resolve(path)?;
        let state = AppState::new(Arc::new(MockBus::new()));
        let request = ApiRequest::new(Method::GET, path).ok()?;
        let response = handler(state, request).await.ok()?;
        Some(response.body)
    }

    #[tokio::test]
    async fn exact_path_beats_pattern() {
        let mut routes = RouteRegistry::new();
        routes.register_pattern(r"/devices/.*", named("pattern")).unwrap();
        routes.register_exact("/devices/hierarchy", named("exact"));

        assert_eq!(resolved_name(&routes, "/devices/hierarchy").await.as_deref(), Some("exact"));
        assert_eq!(resolved_name(&routes, "/devices/north/dev").await.as_deref(), Some("pattern"));
    }

    #[tokio::test]
    async fn first_matching_pattern_wins() {
        let mut routes = RouteRegistry::new();
        routes.register_pattern(r"/devices/north/.*", named("north")).unwrap();
        routes.register_pattern(r"/devices/.*", named("any")).unwrap();

        assert_eq!(resolved_name(&routes, "/devices/north/dev").await.as_deref(), Some("north"));
        assert_eq!(resolved_name(&routes, "/devices/south/dev").await.as_deref(), Some("any"));
    }

    #[tokio::test]
    async fn patterns_are_anchored_at_start() {
        let mut routes = RouteRegistry::new();
        routes.register_pattern(r"/devices/.*", named("pattern")).unwrap();

        assert!(routes.resolve("/api/devices/north").is_none());
        assert!(routes.resolve("/devices").is_none());
        assert!(routes.resolve("/devices/").is_some());
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let mut routes = RouteRegistry::new();
        routes.register_exact("/auth", named("first"));
        routes.register_exact("/auth", named("second"));
        routes.register_pattern(r"/devices/.*", named("first")).unwrap();
        routes.register_pattern(r"/devices/.*", named("second")).unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(resolved_name(&routes, "/auth").await.as_deref(), Some("second"));
        assert_eq!(resolved_name(&routes, "/devices/x").await.as_deref(), Some("second"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let mut routes = RouteRegistry::new();
        let err = routes.register_pattern(r"/devices/(", named("x")).unwrap_err();
        assert!(err.to_string().contains("/devices/("));
        assert!(routes.is_empty());
    }
}
