//! Driver endpoints.

use crate::{
    api::{audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        driver::{self, NewDriver},
    },
    entities::{AuditAction, DriverModel},
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

/// Query string of `GET /drivers`
#[derive(Debug, Deserialize)]
pub struct DriverQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    available: Option<bool>,
}

/// Body of `PATCH /drivers/:id`
#[derive(Debug, Deserialize)]
pub struct AvailabilityUpdate {
    is_available: bool,
}

/// Creates the driver routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers).post(create_driver))
        .route(
            "/drivers/:id",
            get(get_driver)
                .patch(set_availability)
                .delete(deactivate_driver),
        )
}

async fn list_drivers(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DriverQuery>,
) -> ApiResult<Json<Vec<DriverModel>>> {
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(
        driver::list_drivers(&state.db, query.available, page).await?,
    ))
}

async fn create_driver(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewDriver>,
) -> ApiResult<(StatusCode, Json<DriverModel>)> {
    let txn = state.db.begin().await?;
    let created = driver::create_driver(&txn, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Create,
        "driver",
        created.id,
        Some(json!({ "employee_code": created.employee_code })),
    )
    .await?;
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_driver(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DriverModel>> {
    driver::get_driver_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("driver", id))
}

async fn set_availability(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<AvailabilityUpdate>,
) -> ApiResult<Json<DriverModel>> {
    let txn = state.db.begin().await?;
    let updated = driver::set_driver_availability(&txn, id, update.is_available).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "driver",
        id,
        Some(json!({ "is_available": updated.is_available })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(updated))
}

async fn deactivate_driver(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DriverModel>> {
    let txn = state.db.begin().await?;
    let deactivated = driver::deactivate_driver(&txn, id).await?;
    audit(&txn, &auth, AuditAction::Delete, "driver", id, None).await?;
    txn.commit().await?;
    Ok(Json(deactivated))
}
