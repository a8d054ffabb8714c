//! Audit log endpoint.

use crate::{
    api::{auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        audit::{AuditFilter, list_audit_logs},
    },
    entities::AuditLogModel,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

/// Query string of `GET /audit-logs`
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    entity_type: Option<String>,
    entity_id: Option<i64>,
    actor: Option<String>,
}

/// Creates the audit routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/audit-logs", get(list_entries))
}

async fn list_entries(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Vec<AuditLogModel>>> {
    let filter = AuditFilter {
        entity_type: query.entity_type,
        entity_id: query.entity_id,
        actor: query.actor,
    };
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(list_audit_logs(&state.db, &filter, page).await?))
}
