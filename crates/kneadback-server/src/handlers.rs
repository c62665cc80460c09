//! HTTP request handlers. Storage work runs on the blocking pool.

use crate::error::ApiError;
use crate::server::AppState;
use crate::service::{IngestError, IngestionService};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kneadback_core::{FeedbackId, ValidationErrors};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

async fn blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&IngestionService) -> Result<T, IngestError> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    let joined = tokio::task::spawn_blocking(move || work(service.as_ref()))
        .await
        .map_err(|err| ApiError::Internal(format!("storage task failed: {err}")))?;
    joined.map_err(ApiError::from)
}

/// GET /api/health
pub async fn get_health(State(state): State<AppState>) -> Response {
    match blocking(&state, |service| Ok(service.health_check())).await {
        Ok(status) if status.ok => (StatusCode::OK, Json(status)).into_response(),
        Ok(status) => (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /api/feedback
///
/// Only a body that is not JSON at all is a 400. Wrong field types are
/// reported per field with the range checks.
pub async fn post_feedback(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let record = blocking(&state, move |service| service.create_record_json(&body)).await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// GET /api/feedback/{id}
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let id = FeedbackId::from_str(&raw)
        .map_err(|err| ApiError::Validation(ValidationErrors::single("id", err.to_string())))?;
    match blocking(&state, move |service| service.get_record(id)).await? {
        Some(record) => Ok(Json(record).into_response()),
        None => Err(ApiError::NotFound(format!("no feedback with id {id}"))),
    }
}

/// GET /api/feedback?limit=N
pub async fn list_feedback(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let records = blocking(&state, move |service| service.list_records(params.limit)).await?;
    Ok(Json(records).into_response())
}

/// GET /api/insights
pub async fn get_insights(State(state): State<AppState>) -> Result<Response, ApiError> {
    let insights = blocking(&state, |service| service.insights()).await?;
    Ok(Json(insights).into_response())
}
