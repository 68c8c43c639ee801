//! vgated - Platform Gateway Daemon
//!
//! HTTP API over the platforms connected to a message bus: device listings,
//! point reads and writes, and token-based access control.
//!
//! Usage:
//!   vgated [OPTIONS] [config.toml]
//!
//! If no config file is provided, serves demo platforms from the in-memory bus.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vgate_api::{AppState, CredentialVerifier};
use vgate_bus::{JsonRpcBus, MockBus};
use vgate_core::BackendClient;
use vgate_platform::{DeviceProxy, PlatformResolver};

use crate::config::{BusKind, GatewayConfig};

const DEFAULT_LOG_FILTER: &str = "vgated=info,vgate_api=info,vgate_platform=debug,vgate_bus=info";

#[derive(Parser, Debug)]
#[command(name = "vgated")]
#[command(version, about = "Platform gateway daemon - HTTP API over message bus platforms")]
struct Args {
    /// Gateway config file (TOML)
    #[arg(env = "VGATED_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port (overrides [server] port)
    #[arg(short, long, env = "VGATED_PORT")]
    port: Option<u16>,

    /// Log as JSON lines
    #[arg(long, env = "VGATED_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    tracing::info!("Starting vgated (Platform Gateway Daemon)");

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            GatewayConfig::load(path)?
        }
        None => {
            tracing::info!("No config file provided, serving demo platforms");
            GatewayConfig::default()
        }
    };

    let state = build_state(&config)?;
    let app = vgate_api::router(state).context("Failed to register routes")?;

    // Bind to address
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, port))?;
    tracing::info!("Listening on http://{}", addr);

    // Run the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("vgated stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    );

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wire the bus adapter, resolver, device proxy and verifier together
fn build_state(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let bus: Arc<dyn BackendClient> = match config.bus.kind {
        BusKind::Mock => {
            tracing::info!("Using in-memory demo bus");
            Arc::new(MockBus::demo())
        }
        BusKind::JsonRpc => {
            let url = config
                .bus
                .url
                .as_deref()
                .context("[bus] url is required for the jsonrpc bus")?;
            tracing::info!(url, "Using JSON-RPC bus bridge");
            Arc::new(
                JsonRpcBus::with_auth(url, config.bus.auth_token.as_deref())
                    .context("Failed to create bus client")?,
            )
        }
    };

    let resolver = Arc::new(PlatformResolver::with_timeouts(
        bus,
        config.timeouts.call_timeouts(),
    ));
    let devices = DeviceProxy::new(resolver).with_driver_identity(&config.platform.driver_identity);
    let mut state = AppState::from_proxy(devices);

    if let Some(url) = &config.auth.verify_url {
        tracing::info!(url = %url, "Verifying credentials before issuing tokens");
        let verifier = CredentialVerifier::new(url).context("Failed to create credential verifier")?;
        state = state.with_verifier(verifier);
    }

    Ok(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
