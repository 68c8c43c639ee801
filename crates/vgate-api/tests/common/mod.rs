//! Test utilities for the gateway API
//!
//! Runs the real router on an ephemeral port and talks to it over HTTP.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use vgate_api::AppState;
use vgate_bus::{MockBus, MockPlatform};

pub const DEVICE: &str = "campus/bldg/ahu1";

/// A test server that shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve the standard routes over `state`
    pub async fn start(state: AppState) -> Self {
        let router = vgate_api::router(state).expect("routes");

        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("client");

        Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Serve the standard routes over a mock bus
    pub async fn with_bus(bus: MockBus) -> Self {
        Self::start(AppState::new(Arc::new(bus))).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Obtain a token for alice/pw
    pub async fn login(&self) -> String {
        let response = self
            .request(Method::POST, "/auth")
            .json(&json!({"username": "alice", "password": "pw"}))
            .send()
            .await
            .expect("login request");
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.expect("login body");
        body["token"].as_str().expect("token").to_string()
    }

    /// Authorized GET
    pub async fn get(&self, path: &str, token: &str) -> Response {
        self.request(Method::GET, path)
            .header("Authorization", format!("Basic {}", token))
            .send()
            .await
            .expect("request")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// One platform `north` with a driver and a device with two points
pub fn north_bus() -> MockBus {
    MockBus::new()
        .with_platform(
            MockPlatform::new("north")
                .with_driver_uuid("drv-1")
                .with_point(DEVICE, "Temperature", json!(72.5))
                .with_point(DEVICE, "Setpoint", json!(70))
                .with_point(DEVICE, "Mode", json!("cool")),
        )
        .with_peer("pubsub")
}
