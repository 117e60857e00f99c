use super::engine::QueryEngine;
use super::types::{ErrorResponse, QueryParams, Summary};
use crate::error::LakeError;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

pub type QueryResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub async fn handle_inventors(
    Extension(engine): Extension<Arc<QueryEngine>>,
    Query(params): Query<QueryParams>,
) -> QueryResult<Vec<String>> {
    engine.inventors(&params).map(Json).map_err(error_response)
}

pub async fn handle_assignees(
    Extension(engine): Extension<Arc<QueryEngine>>,
    Query(params): Query<QueryParams>,
) -> QueryResult<Vec<String>> {
    engine.assignees(&params).map(Json).map_err(error_response)
}

pub async fn handle_titles(
    Extension(engine): Extension<Arc<QueryEngine>>,
    Query(params): Query<QueryParams>,
) -> QueryResult<Vec<String>> {
    engine.titles(&params).map(Json).map_err(error_response)
}

pub async fn handle_summary(
    Extension(engine): Extension<Arc<QueryEngine>>,
    Query(params): Query<QueryParams>,
) -> QueryResult<Summary> {
    engine.summary(&params).map(Json).map_err(error_response)
}

/// Invalid filters are the client's fault (400); anything else is a 500.
pub fn error_response(err: LakeError) -> (StatusCode, Json<ErrorResponse>) {
    if err.is_client_error() {
        tracing::warn!("Rejected query filter: {}", err);
        let pattern = match &err {
            LakeError::InvalidFilter { pattern, .. } => Some(pattern.clone()),
            _ => None,
        };
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
                pattern,
            }),
        );
    }

    tracing::error!("Query failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
            pattern: None,
        }),
    )
}
