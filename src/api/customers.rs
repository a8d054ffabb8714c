//! Customer endpoints, including inventory and delivery history.

use crate::{
    api::{PageQuery, audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        customer::{self, CustomerFilter, CustomerUpdate, NewCustomer},
        delivery::customer_delivery_history,
        inventory::{self, InventoryAdjustment},
    },
    entities::{AuditAction, CustomerModel, CustomerInventoryModel, DeliveryHistoryModel},
    errors::Error,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use sea_orm::TransactionTrait;
use serde_json::json;
use std::sync::Arc;

/// Query string of `GET /customers`
#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    area: Option<String>,
    is_active: Option<bool>,
    search: Option<String>,
}

/// Creates the customer routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/:id",
            get(get_customer)
                .patch(update_customer)
                .delete(deactivate_customer),
        )
        .route("/customers/:id/inventory", get(get_inventory))
        .route("/customers/:id/inventory/:product_id", put(adjust_inventory))
        .route("/customers/:id/deliveries", get(get_delivery_history))
}

async fn list_customers(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Json<Vec<CustomerModel>>> {
    let filter = CustomerFilter {
        area: query.area,
        is_active: query.is_active,
        search: query.search,
    };
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(customer::list_customers(&state.db, &filter, page).await?))
}

async fn create_customer(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewCustomer>,
) -> ApiResult<(StatusCode, Json<CustomerModel>)> {
    let txn = state.db.begin().await?;
    let created = customer::create_customer(&txn, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Create,
        "customer",
        created.id,
        Some(json!({ "customer_code": created.customer_code })),
    )
    .await?;
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_customer(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CustomerModel>> {
    customer::get_customer_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("customer", id))
}

async fn update_customer(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<CustomerUpdate>,
) -> ApiResult<Json<CustomerModel>> {
    let txn = state.db.begin().await?;
    let updated = customer::update_customer(&txn, id, update).await?;
    audit(&txn, &auth, AuditAction::Update, "customer", id, None).await?;
    txn.commit().await?;
    Ok(Json(updated))
}

async fn deactivate_customer(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CustomerModel>> {
    let txn = state.db.begin().await?;
    let deactivated = customer::deactivate_customer(&txn, id).await?;
    audit(&txn, &auth, AuditAction::Delete, "customer", id, None).await?;
    txn.commit().await?;
    Ok(Json(deactivated))
}

async fn get_inventory(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<CustomerInventoryModel>>> {
    Ok(Json(inventory::get_customer_inventory(&state.db, id).await?))
}

async fn adjust_inventory(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path((id, product_id)): Path<(i64, i64)>,
    Json(adjustment): Json<InventoryAdjustment>,
) -> ApiResult<Json<CustomerInventoryModel>> {
    let txn = state.db.begin().await?;
    let adjusted = inventory::adjust_inventory(&txn, id, product_id, adjustment).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "customer_inventory",
        adjusted.id,
        Some(json!({
            "quantity_owned": adjusted.quantity_owned,
            "quantity_rented": adjusted.quantity_rented,
        })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(adjusted))
}

async fn get_delivery_history(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<DeliveryHistoryModel>>> {
    Ok(Json(
        customer_delivery_history(&state.db, id, query.page()).await?,
    ))
}
