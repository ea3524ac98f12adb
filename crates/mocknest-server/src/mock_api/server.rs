//! Mock-serving HTTP listener.

use crate::engine::ResolutionEngine;
use crate::mock_api::handler::handle_mock_request;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// The listener real clients talk to. Every connection is served by the
/// resolution engine.
pub struct MockServer {
    addr: SocketAddr,
    engine: Arc<ResolutionEngine>,
}

impl MockServer {
    /// Create a new mock server
    pub fn new(addr: SocketAddr, engine: Arc<ResolutionEngine>) -> Self {
        Self { addr, engine }
    }

    /// Bind the configured address and run the mock server
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("Mocknest mock listener on http://{}", self.addr);
        Self::serve(listener, self.engine).await
    }

    /// Serve connections from an already-bound listener. Integration tests
    /// bind to port 0 themselves and hand the listener over.
    pub async fn serve(
        listener: TcpListener,
        engine: Arc<ResolutionEngine>,
    ) -> Result<(), anyhow::Error> {
        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let engine = Arc::clone(&engine);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let engine = Arc::clone(&engine);
                    async move { handle_mock_request(req, engine).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Mock listener connection error: {}", e);
                }
            });
        }
    }
}
