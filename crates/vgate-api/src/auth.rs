//! Request authorization and credential verification

use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use reqwest::{Client, Url};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use vgate_core::{Credentials, TokenStore};

/// Scheme expected in front of the token, compared case-insensitively
pub const AUTH_SCHEME: &str = "BASIC";

const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Token carried by an `Authorization: <scheme> <token>` header.
///
/// The header must hold exactly two whitespace-separated parts and the scheme
/// must be `Basic`. The token is opaque; it is not base64 credentials.
pub fn parse_authorization(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    scheme.eq_ignore_ascii_case(AUTH_SCHEME).then_some(token)
}

/// Whether the request carries a currently active token
pub fn check_authorization(headers: &HeaderMap, tokens: &TokenStore) -> bool {
    parse_authorization(headers).is_some_and(|token| tokens.is_valid(token))
}

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Invalid verification URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Checks username/password pairs against an external authentication endpoint
/// before a token is issued.
///
/// The pair is POSTed as `{"username", "password"}`; a success status with a
/// non-empty body accepts it.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    client: Client,
    url: Url,
}

impl CredentialVerifier {
    pub fn new(url: &str) -> Result<Self, VerifierError> {
        let parsed = Url::parse(url).map_err(|source| VerifierError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let client = Client::builder().timeout(DEFAULT_VERIFY_TIMEOUT).build()?;

        Ok(Self {
            client,
            url: parsed,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the endpoint accepts `credentials`. Any failure to reach it
    /// counts as a rejection.
    pub async fn verify(&self, credentials: &Credentials) -> bool {
        let body = json!({
            "username": credentials.username,
            "password": credentials.password,
        });

        let response = match self.client.post(self.url.clone()).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %self.url, error = %e, "Credential verification failed");
                return false;
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let accepted = status.is_success() && !text.trim().is_empty();

        debug!(username = %credentials.username, %status, accepted, "Verified credentials");
        accepted
    }
}
