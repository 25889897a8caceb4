//! DevGrid controller server.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use devgrid_controller::config::Config;
use devgrid_controller::service::ChannelServiceImpl;
use devgrid_controller::state::AppState;
use devgrid_controller::{http, reaper};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load config
    let config = Config::parse();
    let grpc_addr: SocketAddr = config.grpc_addr.parse()?;
    let http_addr: SocketAddr = config.http_addr.parse()?;

    // Create shared state
    let state = match &config.api_token {
        Some(token) => AppState::with_api_token(token.clone()),
        None => AppState::new(),
    };

    info!(grpc_addr = %grpc_addr, http_addr = %http_addr, "Starting DevGrid controller");

    // Spawn the liveness reaper
    let reaper_state = state.clone();
    let reap_period = Duration::from_secs(config.reap_interval_secs);
    let stale_after = chrono::Duration::seconds(config.stale_after_secs as i64);
    tokio::spawn(async move {
        reaper::run(reaper_state, reap_period, stale_after).await;
    });

    // Create gRPC service
    let channel_service = ChannelServiceImpl::new(state.clone()).into_server();

    // Create HTTP router
    let http_router = http::create_router(state);

    // Start gRPC server
    let grpc_server = Server::builder()
        .add_service(channel_service)
        .serve(grpc_addr);

    // Start HTTP server
    let http_listener = TcpListener::bind(http_addr).await?;
    let http_server = axum::serve(http_listener, http_router);

    info!("gRPC server listening on {}", grpc_addr);
    info!("HTTP server listening on {}", http_addr);

    // Run both servers concurrently
    tokio::select! {
        result = grpc_server => {
            if let Err(e) = result {
                tracing::error!(error = %e, "gRPC server error");
            }
        }
        result = http_server => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server error");
            }
        }
    }

    Ok(())
}
