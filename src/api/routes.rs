//! Route planning and execution endpoints.
//!
//! Drop endpoints (`arrive`, `deliver`, `fail`) are addressed by route and order so a
//! driver app only needs the ids printed on its manifest.

use crate::{
    api::{audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        delivery::{self, DeliveryReport, DropOutcome},
        route::{
            self, AddRouteOrder, NewRoute, RouteAssignment, RouteFilter, RouteWithStops, StopPlan,
        },
    },
    entities::{AuditAction, RouteDeliveryModel, RouteModel, RouteStatus},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::Date};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query string of `GET /routes`
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    route_date: Option<Date>,
    status: Option<RouteStatus>,
    driver_id: Option<i64>,
}

/// Body of `PUT /routes/:id/sequence`
#[derive(Debug, Deserialize)]
pub struct SequenceRequest {
    stops: Vec<StopPlan>,
}

/// Body of `POST /routes/:id/orders/:order_id/fail`
#[derive(Debug, Deserialize)]
pub struct FailureReport {
    reason: Option<String>,
}

/// Creates the route routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes", get(list_routes).post(create_route))
        .route("/routes/:id", get(get_route))
        .route("/routes/:id/assignment", put(assign_route))
        .route("/routes/:id/orders", post(add_order))
        .route("/routes/:id/orders/:order_id", delete(remove_order))
        .route("/routes/:id/sequence", put(resequence))
        .route("/routes/:id/start", post(start_route))
        .route("/routes/:id/complete", post(complete_route))
        .route("/routes/:id/cancel", post(cancel_route))
        .route("/routes/:id/orders/:order_id/arrive", post(arrive))
        .route("/routes/:id/orders/:order_id/deliver", post(deliver))
        .route("/routes/:id/orders/:order_id/fail", post(fail))
}

async fn list_routes(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RouteQuery>,
) -> ApiResult<Json<Vec<RouteModel>>> {
    let filter = RouteFilter {
        route_date: query.route_date,
        status: query.status,
        driver_id: query.driver_id,
    };
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(route::list_routes(&state.db, &filter, page).await?))
}

async fn create_route(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewRoute>,
) -> ApiResult<(StatusCode, Json<RouteModel>)> {
    let txn = state.db.begin().await?;
    let created = route::create_route(&txn, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Create,
        "route",
        created.id,
        Some(json!({ "route_number": created.route_number })),
    )
    .await?;
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_route(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RouteWithStops>> {
    Ok(Json(route::get_route_with_stops(&state.db, id).await?))
}

async fn assign_route(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(assignment): Json<RouteAssignment>,
) -> ApiResult<Json<RouteModel>> {
    let txn = state.db.begin().await?;
    let updated = route::assign_route(&txn, id, assignment).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "route",
        id,
        Some(json!({
            "driver_id": updated.driver_id,
            "vehicle_id": updated.vehicle_id,
        })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(updated))
}

async fn add_order(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<AddRouteOrder>,
) -> ApiResult<Json<RouteWithStops>> {
    let txn = state.db.begin().await?;
    let order_id = input.order_id;
    let planned = route::add_order_to_route(&txn, id, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "route",
        id,
        Some(json!({ "added_order_id": order_id })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(planned))
}

async fn remove_order(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(i64, i64)>,
) -> ApiResult<Json<RouteWithStops>> {
    let txn = state.db.begin().await?;
    let planned = route::remove_order_from_route(&txn, id, order_id).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "route",
        id,
        Some(json!({ "removed_order_id": order_id })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(planned))
}

async fn resequence(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<SequenceRequest>,
) -> ApiResult<Json<RouteWithStops>> {
    let txn = state.db.begin().await?;
    let planned = route::resequence_route(&txn, id, request.stops).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "route",
        id,
        Some(json!({ "total_distance_km": planned.route.total_distance_km })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(planned))
}

async fn record_route_status(
    txn: &DatabaseTransaction,
    auth: &RequireApiKey,
    route: &RouteModel,
) -> ApiResult<()> {
    audit(
        txn,
        auth,
        AuditAction::StatusChange,
        "route",
        route.id,
        Some(json!({ "status": route.status })),
    )
    .await
}

async fn start_route(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RouteModel>> {
    let txn = state.db.begin().await?;
    let started = route::start_route(&txn, id).await?;
    record_route_status(&txn, &auth, &started).await?;
    txn.commit().await?;
    Ok(Json(started))
}

async fn complete_route(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RouteModel>> {
    let txn = state.db.begin().await?;
    let completed = route::complete_route(&txn, id).await?;
    record_route_status(&txn, &auth, &completed).await?;
    txn.commit().await?;
    Ok(Json(completed))
}

async fn cancel_route(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RouteModel>> {
    let txn = state.db.begin().await?;
    let cancelled = route::cancel_route(&txn, id).await?;
    record_route_status(&txn, &auth, &cancelled).await?;
    txn.commit().await?;
    Ok(Json(cancelled))
}

async fn arrive(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(i64, i64)>,
) -> ApiResult<Json<RouteDeliveryModel>> {
    Ok(Json(delivery::mark_arrived(&state.db, id, order_id).await?))
}

async fn deliver(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(i64, i64)>,
    Json(report): Json<DeliveryReport>,
) -> ApiResult<Json<DropOutcome>> {
    let txn = state.db.begin().await?;
    let outcome = delivery::complete_drop(&txn, id, order_id, report).await?;
    audit(
        &txn,
        &auth,
        AuditAction::StatusChange,
        "order",
        order_id,
        Some(json!({ "status": "delivered", "route_id": id })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(outcome))
}

async fn fail(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(i64, i64)>,
    Json(report): Json<FailureReport>,
) -> ApiResult<Json<DropOutcome>> {
    let txn = state.db.begin().await?;
    let outcome = delivery::fail_drop(&txn, id, order_id, report.reason).await?;
    audit(
        &txn,
        &auth,
        AuditAction::StatusChange,
        "order",
        order_id,
        Some(json!({ "status": "confirmed", "failed_on_route_id": id })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(outcome))
}
