//! Mocknest server entry point.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (admin on 4545, mock listener on 4546)
//! mocknest
//!
//! # Load a config file and seed endpoints from YAML
//! mocknest --config mocknest.yaml --seed endpoints.yaml
//!
//! # Override the ports
//! mocknest --admin-port 9545 --mock-port 9546
//! ```

use clap::Parser;
use mocknest_server::admin_api::{AdminApiServer, AdminState};
use mocknest_server::config::{Config, SeedFile};
use mocknest_server::engine::ResolutionEngine;
use mocknest_server::mock_api::MockServer;
use mocknest_server::store::create_store;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "mocknest")]
#[command(author, version, about = "Preset-driven mock HTTP server")]
struct Args {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host both listeners bind to
    #[arg(long)]
    host: Option<String>,

    /// Admin API port
    #[arg(long, env = "MOCKNEST_ADMIN_PORT")]
    admin_port: Option<u16>,

    /// Mock listener port
    #[arg(long, env = "MOCKNEST_MOCK_PORT")]
    mock_port: Option<u16>,

    /// YAML file of endpoints (with presets) to load at startup
    #[arg(short, long)]
    seed: Option<PathBuf>,
}

fn init_tracing(log_filter: Option<&str>) {
    // RUST_LOG wins, then the config file, then an info baseline.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match log_filter {
            Some(f) => tracing_subscriber::EnvFilter::new(f),
            None => tracing_subscriber::EnvFilter::new("info"),
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.admin_port {
        config.admin_port = port;
    }
    if let Some(port) = args.mock_port {
        config.mock_port = port;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    config.validate()?;

    init_tracing(config.log_filter.as_deref());
    info!("Starting mocknest {}", env!("CARGO_PKG_VERSION"));

    let store = create_store(&config.store.backend)?;

    if let Some(seed_path) = &config.seed {
        let seed = SeedFile::from_file(seed_path)?;
        let count = seed.apply(store.as_ref())?;
        info!(
            "Seeded {} endpoint(s) from {}",
            count,
            seed_path.display()
        );
    }

    let engine = Arc::new(ResolutionEngine::new(store.clone(), store.clone()));
    let state = Arc::new(AdminState::new(store.clone(), store));

    let admin_addr: SocketAddr = format!("{}:{}", config.host, config.admin_port).parse()?;
    let mock_addr: SocketAddr = format!("{}:{}", config.host, config.mock_port).parse()?;

    let admin = tokio::spawn(AdminApiServer::new(admin_addr, state).run());
    let mock = tokio::spawn(MockServer::new(mock_addr, engine).run());

    tokio::select! {
        result = admin => {
            if let Ok(Err(e)) = result {
                error!("Admin API server error: {}", e);
            }
        }
        result = mock => {
            if let Ok(Err(e)) = result {
                error!("Mock listener error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(_) => {
                tokio::signal::ctrl_c().await.ok();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
