use super::memory::PatentStore;
use super::types::StoreStats;

use axum::{Extension, Json, http::StatusCode};
use std::sync::Arc;

pub async fn handle_stats(
    Extension(store): Extension<Arc<PatentStore>>,
) -> (StatusCode, Json<StoreStats>) {
    let stats = store.stats();
    tracing::debug!("Store stats: {:?}", stats);
    (StatusCode::OK, Json(stats))
}
