//! Inbound webhook endpoints.
//!
//! Payloads are stored untouched and acknowledged with `202 Accepted`; processing
//! happens out of band and is reported back through the `processed`/`failed` routes.

use crate::{
    api::{auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        webhook::{self, WebhookFilter},
    },
    entities::{WebhookLogModel, WebhookStatus},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Query string of `GET /webhooks`
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    source: Option<String>,
    status: Option<WebhookStatus>,
}

/// Body of `POST /webhooks/logs/:id/failed`
#[derive(Debug, Deserialize)]
pub struct ProcessingFailure {
    error_message: String,
}

/// Creates the webhook routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhooks", get(list_logs))
        .route("/webhooks/:source", post(receive))
        .route("/webhooks/logs/:id/processed", post(mark_processed))
        .route("/webhooks/logs/:id/failed", post(mark_failed))
}

async fn list_logs(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookQuery>,
) -> ApiResult<Json<Vec<WebhookLogModel>>> {
    let filter = WebhookFilter {
        source: query.source,
        status: query.status,
    };
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(
        webhook::list_webhook_logs(&state.db, &filter, page).await?,
    ))
}

async fn receive(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<WebhookLogModel>)> {
    let log = webhook::log_webhook(&state.db, &source, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(log)))
}

async fn mark_processed(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<WebhookLogModel>> {
    Ok(Json(webhook::mark_webhook_processed(&state.db, id).await?))
}

async fn mark_failed(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(failure): Json<ProcessingFailure>,
) -> ApiResult<Json<WebhookLogModel>> {
    Ok(Json(
        webhook::mark_webhook_failed(&state.db, id, &failure.error_message).await?,
    ))
}
