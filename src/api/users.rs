//! Staff user endpoints.

use crate::{
    api::{audit, auth::RequireApiKey, error::ApiResult, state::AppState},
    core::{
        Pagination,
        user::{self, NewUser},
    },
    entities::{AuditAction, UserModel, UserRole},
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

/// Query string of `GET /users`
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    role: Option<UserRole>,
}

/// Body of `PATCH /users/:id`
#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    role: UserRole,
}

/// Creates the user routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(set_role).delete(deactivate_user),
        )
}

async fn list_users(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<UserModel>>> {
    let page = Pagination::new(query.skip, query.limit);
    Ok(Json(user::list_users(&state.db, query.role, page).await?))
}

async fn create_user(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<UserModel>)> {
    let txn = state.db.begin().await?;
    let created = user::create_user(&txn, input).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Create,
        "user",
        created.id,
        Some(json!({ "username": created.username, "role": created.role })),
    )
    .await?;
    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_user(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserModel>> {
    user::get_user_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("user", id))
}

async fn set_role(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<RoleUpdate>,
) -> ApiResult<Json<UserModel>> {
    let txn = state.db.begin().await?;
    let updated = user::set_user_role(&txn, id, update.role).await?;
    audit(
        &txn,
        &auth,
        AuditAction::Update,
        "user",
        id,
        Some(json!({ "role": updated.role })),
    )
    .await?;
    txn.commit().await?;
    Ok(Json(updated))
}

async fn deactivate_user(
    auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserModel>> {
    let txn = state.db.begin().await?;
    let deactivated = user::deactivate_user(&txn, id).await?;
    audit(&txn, &auth, AuditAction::Delete, "user", id, None).await?;
    txn.commit().await?;
    Ok(Json(deactivated))
}
