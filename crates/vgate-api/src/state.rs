//! Application state for the gateway API

use std::sync::Arc;

use tracing::warn;
use vgate_core::{BackendClient, TokenStore};
use vgate_platform::{DeviceProxy, PlatformResolver};

use crate::auth::{check_authorization, CredentialVerifier};
use crate::dispatch::ApiRequest;
use crate::error::ApiError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Active API tokens
    tokens: Arc<TokenStore>,
    resolver: Arc<PlatformResolver>,
    devices: Arc<DeviceProxy>,
    /// Checks credentials before a token is issued (optional)
    verifier: Option<Arc<CredentialVerifier>>,
}

impl AppState {
    /// Create state over a bus client with default timeouts and driver identity
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        let resolver = Arc::new(PlatformResolver::new(client));
        Self::from_proxy(DeviceProxy::new(resolver))
    }

    /// Create state around an already configured device proxy
    pub fn from_proxy(devices: DeviceProxy) -> Self {
        Self {
            tokens: Arc::new(TokenStore::new()),
            resolver: devices.resolver().clone(),
            devices: Arc::new(devices),
            verifier: None,
        }
    }

    /// Verify credentials with `verifier` before issuing tokens
    pub fn with_verifier(mut self, verifier: CredentialVerifier) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn resolver(&self) -> &PlatformResolver {
        &self.resolver
    }

    pub fn devices(&self) -> &DeviceProxy {
        &self.devices
    }

    pub fn verifier(&self) -> Option<&CredentialVerifier> {
        self.verifier.as_deref()
    }

    /// Fail with `Unauthorized` unless the request carries an active token
    pub fn authorize(&self, request: &ApiRequest) -> Result<(), ApiError> {
        if check_authorization(&request.headers, &self.tokens) {
            Ok(())
        } else {
            warn!(path = %request.path(), "Rejected unauthorized request");
            Err(ApiError::Unauthorized)
        }
    }
}
