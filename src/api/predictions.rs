//! Delivery prediction endpoints.

use crate::{
    api::{audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        prediction::{self, PredictionBatch, PredictionFilter},
    },
    entities::{AuditAction, DeliveryPredictionModel},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use sea_orm::{TransactionTrait, prelude::Date};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query string of `GET /predictions`
#[derive(Debug, Deserialize)]
pub struct PredictionQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    batch_id: Option<String>,
    customer_id: Option<i64>,
    date_from: Option<Date>,
    date_to: Option<Date>,
    converted: Option<bool>,
}

/// Creates the prediction routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/predictions", get(list_predictions).post(store_batch))
        .route("/predictions/:id/convert", post(mark_converted))
}

async fn list_predictions(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<Json<Vec<DeliveryPredictionModel>>> {
    let filter = PredictionFilter {
        batch_id: query.batch_id,
        customer_id: query.customer_id,
        date_from: query.date_from,
        date_to: query.date_to,
        converted: query.converted,
    };
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(
        prediction::list_predictions(&state.db, &filter, page).await?,
    ))
}

async fn store_batch(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(batch): Json<PredictionBatch>,
) -> ApiResult<(StatusCode, Json<Vec<DeliveryPredictionModel>>)> {
    let txn = state.db.begin().await?;
    let stored = prediction::store_prediction_batch(&txn, batch).await?;
    if let Some(first) = stored.first() {
        audit(
            &txn,
            &auth,
            AuditAction::Create,
            "delivery_prediction",
            first.id,
            Some(json!({
                "prediction_batch_id": first.prediction_batch_id,
                "count": stored.len(),
            })),
        )
        .await?;
    }
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn mark_converted(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeliveryPredictionModel>> {
    let txn = state.db.begin().await?;
    let converted = prediction::mark_prediction_converted(&txn, id).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "delivery_prediction",
        id,
        Some(json!({ "is_converted_to_order": true })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(converted))
}
