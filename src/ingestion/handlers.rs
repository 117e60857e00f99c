use super::orchestrator::IngestOrchestrator;
use super::types::{BatchOptions, IngestBatch, IngestParams};
use crate::query::types::{ErrorResponse, parse_flag};

use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One orchestrator per process; the lock keeps batches sequential.
pub type SharedOrchestrator = Arc<Mutex<IngestOrchestrator>>;

type IngestResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Runs a batch over `raw/patents` (after promoting `staging`) and returns it
/// once complete. The batch runs on the blocking pool.
pub async fn handle_ingest(
    Extension(orchestrator): Extension<SharedOrchestrator>,
    Query(params): Query<IngestParams>,
) -> IngestResult<IngestBatch> {
    let options = BatchOptions {
        historical: parse_flag(params.historical.as_deref()),
        promote_staged: true,
    };

    let mut guard = orchestrator.lock_owned().await;
    let outcome = tokio::task::spawn_blocking(move || guard.run_batch(&options)).await;

    match outcome {
        Ok(Ok(batch)) => Ok(Json(batch)),
        Ok(Err(err)) => Err(internal_error(format!("{:#}", err))),
        Err(err) => Err(internal_error(format!("ingest task failed: {}", err))),
    }
}

pub async fn handle_batches(
    Extension(orchestrator): Extension<SharedOrchestrator>,
) -> (StatusCode, Json<Vec<IngestBatch>>) {
    let batches = orchestrator.lock().await.batches().to_vec();
    (StatusCode::OK, Json(batches))
}

fn internal_error(error: String) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Ingest failed: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error,
            pattern: None,
        }),
    )
}
