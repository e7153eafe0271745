//! TCP transport implementation.
//!
//! Line-delimited JSON-RPC over raw TCP. Every connection gets its own MCP
//! session; all sessions share one server and therefore one adapter set.

use std::net::SocketAddr;

use rmcp::ServiceExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Accept connections until the listener fails to bind.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (JSON-RPC over TCP)", addr);

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    info!("Accepted connection from {}", peer);
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                    }
                    tokio::spawn(Self::serve_connection(server.clone(), stream, peer));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    async fn serve_connection(server: McpServer, stream: TcpStream, peer: SocketAddr) {
        let service = match server.serve(stream).await {
            Ok(service) => service,
            Err(e) => {
                warn!("Failed to initialize session for {}: {}", peer, e);
                return;
            }
        };

        match service.waiting().await {
            Ok(_) => info!("Client {} disconnected", peer),
            Err(e) => warn!("Session with {} ended with error: {}", peer, e),
        }
    }
}
