use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use clap::Parser;
use patent_lake::config::{Command, LakeConfig};
use patent_lake::ingestion::IngestOrchestrator;
use patent_lake::ingestion::handlers::{SharedOrchestrator, handle_batches, handle_ingest};
use patent_lake::ingestion::types::BatchOptions;
use patent_lake::query::QueryEngine;
use patent_lake::query::handlers::{
    handle_assignees, handle_inventors, handle_summary, handle_titles,
};
use patent_lake::storage::handlers::handle_stats;
use patent_lake::storage::{PatentStore, persist};
use patent_lake::zones::{FsZoneStore, ZoneStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = LakeConfig::parse();

    // 1. Zones:
    let fs = FsZoneStore::new(&config.lake_root);
    fs.scaffold()?;
    tracing::info!("Lake root: {}", fs.root().display());
    let zones: Arc<dyn ZoneStore> = Arc::new(fs);

    match config.command {
        Command::Serve { bind } => serve(zones, bind).await,
        Command::Ingest {
            historical,
            no_promote,
        } => {
            let store = Arc::new(PatentStore::new());
            persist::restore(zones.as_ref(), &store)?;
            let mut orchestrator = IngestOrchestrator::new(zones, store)?;
            let options = BatchOptions {
                historical,
                promote_staged: !no_promote,
            };
            let batch =
                tokio::task::spawn_blocking(move || orchestrator.run_batch(&options)).await??;
            println!("{}", serde_json::to_string_pretty(&batch)?);
            Ok(())
        }
        Command::Wipe { zone } => Ok(zones.wipe(zone)?),
    }
}

async fn serve(zones: Arc<dyn ZoneStore>, bind: SocketAddr) -> anyhow::Result<()> {
    // 2. Storage layer, restored from the lake's artifacts:
    let store = Arc::new(PatentStore::new());
    persist::restore(zones.as_ref(), &store)?;

    let engine = Arc::new(QueryEngine::new(store.clone()));
    let orchestrator: SharedOrchestrator =
        Arc::new(Mutex::new(IngestOrchestrator::new(zones, store.clone())?));

    // 3. HTTP Router:
    let app = Router::new()
        .route("/api/inventors", get(handle_inventors))
        .route("/api/assignees", get(handle_assignees))
        .route("/api/titles", get(handle_titles))
        .route("/api/summary", get(handle_summary))
        .route("/api/ingest", post(handle_ingest))
        .route("/api/batches", get(handle_batches))
        .route("/api/stats", get(handle_stats))
        .layer(Extension(engine))
        .layer(Extension(orchestrator))
        .layer(Extension(store));

    // 4. Start HTTP server:
    tracing::info!("HTTP server listening on {}", bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
