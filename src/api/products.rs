//! Gas product catalog endpoints.

use crate::{
    api::{audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        gas_product::{self, GasProductUpdate, NewGasProduct},
    },
    entities::{AuditAction, GasProductModel},
    errors::Error,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use sea_orm::TransactionTrait;
use serde_json::json;
use std::sync::Arc;

/// Query string of `GET /products`
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    available_only: Option<bool>,
}

/// Creates the product routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product).patch(update_product))
}

async fn list_products(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<GasProductModel>>> {
    let page = Pagination::new(query.skip, query.limit);
    let available_only = query.available_only.unwrap_or(false);
    Ok(Json(
        gas_product::list_gas_products(&state.db, available_only, page).await?,
    ))
}

async fn create_product(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewGasProduct>,
) -> ApiResult<(StatusCode, Json<GasProductModel>)> {
    let txn = state.db.begin().await?;
    let created = gas_product::create_gas_product(&txn, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Create,
        "gas_product",
        created.id,
        Some(json!({ "sku": created.sku })),
    )
    .await?;
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_product(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<GasProductModel>> {
    gas_product::get_gas_product_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("gas product", id))
}

async fn update_product(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<GasProductUpdate>,
) -> ApiResult<Json<GasProductModel>> {
    let txn = state.db.begin().await?;
    let updated = gas_product::update_gas_product(&txn, id, update).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "gas_product",
        id,
        Some(json!({
            "unit_price": updated.unit_price,
            "is_available": updated.is_available,
        })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(updated))
}
