//! Playlens HTTP server entrypoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use playlens::config::Config;
use playlens::context::LiveContext;
use playlens::gateway::{HandlerState, create_router_with_state};
use playlens::indexer::CatalogIndexer;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    if let Some(path) = ingest_path() {
        return run_ingest(&config, path).await;
    }

    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        qdrant_url = %config.qdrant_url,
        collection = %config.collection,
        "Playlens starting"
    );

    let context = Arc::new(LiveContext::connect(&config).await?);
    let app = create_router_with_state(HandlerState::new(Arc::clone(&context)));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    release(context).await;
    tracing::info!("Playlens shutdown complete");
    Ok(())
}

/// `--ingest <path>`: load a JSON-lines catalog into the collection, then exit.
fn ingest_path() -> Option<PathBuf> {
    let mut args = std::env::args().skip_while(|arg| arg != "--ingest");
    args.next()?;
    args.next().map(PathBuf::from)
}

async fn run_ingest(config: &Config, path: PathBuf) -> anyhow::Result<()> {
    let context = LiveContext::connect(config).await?;

    let summary = CatalogIndexer::new(context.embedder(), context.store())
        .index_file(&path)
        .await
        .with_context(|| format!("ingesting {}", path.display()))?;

    tracing::info!(
        read = summary.read,
        skipped_lines = summary.skipped_lines,
        embedded = summary.embedded,
        without_vector = summary.without_vector,
        upserted = summary.upserted,
        failed_batches = summary.failed_batches,
        "Ingestion finished"
    );

    context.shutdown().await;
    Ok(())
}

async fn release(context: Arc<LiveContext>) {
    match Arc::try_unwrap(context) {
        Ok(context) => context.shutdown().await,
        Err(_) => tracing::warn!("Service context still shared at exit, skipping teardown"),
    }
}

fn run_health_check() -> i32 {
    let port = std::env::var("PLAYLENS_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(5002);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
