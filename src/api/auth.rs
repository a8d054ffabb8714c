//! API key authentication.
//!
//! Protected handlers take a [`RequireApiKey`] argument; the extractor checks the
//! `x-api-key` header against the stored key hashes before the handler runs.

use crate::{
    api::state::AppState,
    core::api_key::authenticate,
    entities::api_key,
    errors::Error,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::HeaderMap, request::Parts},
};
use std::sync::Arc;
use tracing::warn;

/// Header carrying the API key secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct RequireApiKey(pub api_key::Model);

impl RequireApiKey {
    /// Name recorded as actor in audit logs.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.0.name
    }
}

/// Reads the presented secret from the headers.
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireApiKey {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(secret) = presented_key(&parts.headers) else {
            warn!("Missing x-api-key header");
            return Err(Error::Unauthorized);
        };
        authenticate(&state.db, secret).await.map(Self)
    }
}
