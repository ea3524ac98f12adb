//! Admin API server.

use crate::admin_api::router::route_request;
use crate::engine::PresetSelector;
use crate::store::{EndpointStore, PresetStore};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Shared handles the admin handlers work against.
pub struct AdminState {
    pub endpoints: Arc<dyn EndpointStore>,
    pub presets: Arc<dyn PresetStore>,
    /// Activation goes through the selector so toggles are logged and
    /// counted in one place.
    pub selector: PresetSelector,
}

impl AdminState {
    pub fn new(endpoints: Arc<dyn EndpointStore>, presets: Arc<dyn PresetStore>) -> Self {
        let selector = PresetSelector::new(Arc::clone(&presets));
        Self {
            endpoints,
            presets,
            selector,
        }
    }
}

/// Admin API server for mocknest
pub struct AdminApiServer {
    addr: SocketAddr,
    state: Arc<AdminState>,
}

impl AdminApiServer {
    /// Create a new admin API server
    pub fn new(addr: SocketAddr, state: Arc<AdminState>) -> Self {
        Self { addr, state }
    }

    /// Bind the configured address and run the admin API server
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("Mocknest admin API listening on http://{}", self.addr);
        Self::serve(listener, self.state).await
    }

    /// Serve connections from an already-bound listener. Integration tests
    /// bind to port 0 themselves and hand the listener over.
    pub async fn serve(listener: TcpListener, state: Arc<AdminState>) -> Result<(), anyhow::Error> {
        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let state = Arc::clone(&state);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { route_request(req, state).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Admin API connection error: {}", e);
                }
            });
        }
    }
}
