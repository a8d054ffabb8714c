//! Delivery record endpoints.

use crate::{
    api::{auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        delivery::{self, DeliveryFilter},
    },
    entities::{DeliveryModel, DeliveryStatus},
};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

/// Query string of `GET /deliveries`
#[derive(Debug, Deserialize)]
pub struct DeliveryQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    route_id: Option<i64>,
    driver_id: Option<i64>,
    status: Option<DeliveryStatus>,
}

/// Creates the delivery routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/deliveries", get(list_deliveries))
}

async fn list_deliveries(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeliveryQuery>,
) -> ApiResult<Json<Vec<DeliveryModel>>> {
    let filter = DeliveryFilter {
        route_id: query.route_id,
        driver_id: query.driver_id,
        status: query.status,
    };
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(
        delivery::list_deliveries(&state.db, &filter, page).await?,
    ))
}
