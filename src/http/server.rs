//! Local development server.
//!
//! # Responsibilities
//! - Serve a bootstrapped `Server` on a directly addressable listener
//! - Plain HTTP semantics: no event or reply translation happens here
//! - Graceful shutdown on signal or coordinator trigger

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::app::bootstrap::Server;
use crate::lifecycle::Shutdown;

/// HTTP server for local mode.
pub struct LocalServer {
    server: Server,
}

impl LocalServer {
    /// Wrap an already built server.
    pub fn new(server: Server) -> Self {
        Self { server }
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Local server starting");

        let app = self
            .server
            .into_router()
            .into_make_service_with_connect_info::<SocketAddr>();

        let signalled = shutdown.signalled();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signalled.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Local server stopped");
        Ok(())
    }
}
