use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::{self, AppState};

/// HTTP server
pub struct Server {
  listener: TcpListener,
  local_addr: SocketAddr,
  router: Router,
}

impl Server {
  /// Create and bind HTTP server to specified address
  pub async fn bind(addr: SocketAddr, state: AppState) -> std::io::Result<Self> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!("HTTP server bound to {}", local_addr);

    Ok(Self {
      listener,
      local_addr,
      router: api::router(state),
    })
  }

  /// Get local listening address
  pub fn local_addr(&self) -> SocketAddr {
    self.local_addr
  }

  /// Start server, serve requests until ctrl-c
  pub async fn run(self) -> std::io::Result<()> {
    info!("Server started, listening on {}", self.local_addr);

    axum::serve(self.listener, self.router)
      .with_graceful_shutdown(shutdown_signal())
      .await?;

    info!("Server stopped");
    Ok(())
  }
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => info!("Shutdown signal received"),
    Err(e) => error!("Failed to listen for shutdown signal: {}", e),
  }
}
