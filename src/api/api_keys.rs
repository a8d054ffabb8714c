//! API key management endpoints.

use crate::{
    api::{PageQuery, audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::api_key::{self, IssuedKey, NewApiKey},
    entities::{ApiKeyModel, AuditAction},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use sea_orm::TransactionTrait;
use serde_json::json;
use std::sync::Arc;

/// Creates the API key routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api-keys", get(list_keys).post(issue_key))
        .route("/api-keys/:id", delete(revoke_key))
}

async fn list_keys(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<ApiKeyModel>>> {
    Ok(Json(api_key::list_api_keys(&state.db, query.page()).await?))
}

async fn issue_key(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewApiKey>,
) -> ApiResult<(StatusCode, Json<IssuedKey>)> {
    let txn = state.db.begin().await?;
    let issued = api_key::issue_api_key(&txn, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Create,
        "api_key",
        issued.key.id,
        Some(json!({ "name": issued.key.name, "key_prefix": issued.key.key_prefix })),
    )
    .await?;
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn revoke_key(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiKeyModel>> {
    let txn = state.db.begin().await?;
    let revoked = api_key::revoke_api_key(&txn, id).await?;
    audit(&txn, &auth, AuditAction::Delete, "api_key", id, None).await?;
    txn.commit().await?;
    Ok(Json(revoked))
}
