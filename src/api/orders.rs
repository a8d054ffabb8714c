//! Order endpoints.

use crate::{
    api::{audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        order::{self, NewOrder, OrderFilter, OrderUpdate, OrderWithItems},
    },
    entities::{AuditAction, OrderModel, OrderStatus, PaymentStatus},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use sea_orm::{TransactionTrait, prelude::Date};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query string of `GET /orders`
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    status: Option<OrderStatus>,
    customer_id: Option<i64>,
    route_id: Option<i64>,
    date_from: Option<Date>,
    date_to: Option<Date>,
    is_urgent: Option<bool>,
}

/// Body of `POST /orders/:id/status`
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    status: OrderStatus,
}

/// Body of `PUT /orders/:id/payment`
#[derive(Debug, Deserialize)]
pub struct PaymentChange {
    payment_status: PaymentStatus,
    payment_method: Option<String>,
}

/// Creates the order routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order).patch(update_order))
        .route("/orders/:id/status", post(change_status))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/payment", put(change_payment))
}

async fn list_orders(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Json<Vec<OrderModel>>> {
    let filter = OrderFilter {
        status: query.status,
        customer_id: query.customer_id,
        route_id: query.route_id,
        date_from: query.date_from,
        date_to: query.date_to,
        is_urgent: query.is_urgent,
    };
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(order::list_orders(&state.db, &filter, page).await?))
}

async fn create_order(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<OrderWithItems>)> {
    let txn = state.db.begin().await?;
    let created = order::create_order(&txn, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Create,
        "order",
        created.order.id,
        Some(json!({
            "order_number": created.order.order_number,
            "final_amount": created.order.final_amount,
        })),
    )
    .await?;
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_order(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderWithItems>> {
    Ok(Json(order::get_order_with_items(&state.db, id).await?))
}

async fn update_order(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<OrderUpdate>,
) -> ApiResult<Json<OrderModel>> {
    let txn = state.db.begin().await?;
    let updated = order::update_order(&txn, id, update).await?;
    audit(&txn, &auth, AuditAction::Update, "order", id, None).await?;
    txn.commit().await?;
    Ok(Json(updated))
}

async fn change_status(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<OrderModel>> {
    let txn = state.db.begin().await?;
    let updated = order::update_order_status(&txn, id, change.status).await?;
    audit(
        &txn,
        &auth,
        AuditAction::StatusChange,
        "order",
        id,
        Some(json!({ "status": updated.status })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(updated))
}

async fn cancel_order(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderModel>> {
    let txn = state.db.begin().await?;
    let cancelled = order::cancel_order(&txn, id).await?;
    audit(
        &txn,
        &auth,
        AuditAction::StatusChange,
        "order",
        id,
        Some(json!({ "status": cancelled.status })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(cancelled))
}

async fn change_payment(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(change): Json<PaymentChange>,
) -> ApiResult<Json<OrderModel>> {
    let txn = state.db.begin().await?;
    let updated = order::update_payment_status(
        &txn,
        id,
        change.payment_status,
        change.payment_method,
    )
    .await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "order",
        id,
        Some(json!({ "payment_status": updated.payment_status })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(updated))
}
