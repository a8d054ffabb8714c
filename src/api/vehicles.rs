//! Vehicle endpoints.

use crate::{
    api::{audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        vehicle::{self, NewVehicle},
    },
    entities::{AuditAction, VehicleModel, VehicleType},
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

/// Query string of `GET /vehicles`
#[derive(Debug, Deserialize)]
pub struct VehicleQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    vehicle_type: Option<VehicleType>,
}

/// Body of `PUT /vehicles/:id/driver`; `null` clears the assignment
#[derive(Debug, Deserialize)]
pub struct DriverAssignment {
    driver_id: Option<i64>,
}

/// Creates the vehicle routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/:id", get(get_vehicle))
        .route("/vehicles/:id/driver", put(assign_driver))
}

async fn list_vehicles(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<VehicleQuery>,
) -> ApiResult<Json<Vec<VehicleModel>>> {
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(
        vehicle::list_vehicles(&state.db, query.vehicle_type, page).await?,
    ))
}

async fn create_vehicle(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewVehicle>,
) -> ApiResult<(StatusCode, Json<VehicleModel>)> {
    let txn = state.db.begin().await?;
    let created = vehicle::create_vehicle(&txn, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Create,
        "vehicle",
        created.id,
        Some(json!({ "plate_number": created.plate_number })),
    )
    .await?;
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_vehicle(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<VehicleModel>> {
    vehicle::get_vehicle_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("vehicle", id))
}

async fn assign_driver(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(assignment): Json<DriverAssignment>,
) -> ApiResult<Json<VehicleModel>> {
    let txn = state.db.begin().await?;
    let updated = vehicle::assign_vehicle_driver(&txn, id, assignment.driver_id).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "vehicle",
        id,
        Some(json!({ "driver_id": updated.driver_id })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(updated))
}
