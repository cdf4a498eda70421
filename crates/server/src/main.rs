//! cohortgate HTTP server
use anyhow::{Context, Result};
use clap::Parser;
use cohortgate_config::ConfigLoader;
use cohortgate_core::MemoryStore;
use cohortgate_server::{maintenance, router, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "cohortgate authorization server")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON document with users, sessions, role assignments and memberships
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Override the configured listen address
    #[arg(short, long)]
    address: Option<SocketAddr>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(true),
        )
        .with(filter)
        .init();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(address) = args.address {
        config.server.bind_address = address;
    }

    let store = match &args.seed {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read seed file {}", path.display()))?;
            MemoryStore::from_json(&raw).context("failed to load seed data")?
        }
        None => MemoryStore::new(),
    };

    let address = config.server.bind_address;
    let state = AppState::new(config, Arc::new(store));
    let background = maintenance::spawn(&state);
    let audit = state.audit.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("cohortgate listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    for task in background {
        task.abort();
    }
    maintenance::drain_audit(audit).await;
    info!("cohortgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
