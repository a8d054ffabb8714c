//! API keys - Issuing, checking and revoking credentials for API callers.
//!
//! Secrets look like `dh_` followed by 40 alphanumerics. Only the hex SHA-256 of a
//! secret is stored, together with its first characters for identification. The
//! plaintext is returned once, when the key is issued.

use crate::{
    core::{Pagination, required_text},
    entities::{ApiKey, api_key},
    errors::{Error, Result},
};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

/// Prefix of every generated secret
pub const SECRET_PREFIX: &str = "dh_";
/// Random characters after the prefix
const SECRET_RANDOM_LEN: usize = 40;
/// Characters of the secret kept in clear for identification
pub const KEY_PREFIX_LEN: usize = 8;
/// Shortest secret accepted from configuration
pub const MIN_SECRET_LEN: usize = 16;
/// Name given to the key installed from configuration
pub const BOOTSTRAP_KEY_NAME: &str = "bootstrap";

/// Input for issuing a key
#[derive(Debug, Clone, Deserialize)]
pub struct NewApiKey {
    /// Label of the key owner
    pub name: String,
    /// Optional expiry
    pub expires_at: Option<DateTimeUtc>,
}

/// A freshly issued key with its plaintext secret
#[derive(Debug, Clone, Serialize)]
pub struct IssuedKey {
    /// Stored key record
    #[serde(flatten)]
    pub key: api_key::Model,
    /// Plaintext secret; not retrievable later
    pub secret: String,
}

/// Hex-encoded SHA-256 of a secret.
#[must_use]
pub fn hash_key(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Generates a new random secret.
#[must_use]
pub fn generate_secret() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{SECRET_PREFIX}{random}")
}

fn key_prefix(secret: &str) -> String {
    secret.chars().take(KEY_PREFIX_LEN).collect()
}

/// Stores a key for a known secret.
///
/// # Errors
/// Returns a validation error for a blank name or a secret shorter than
/// [`MIN_SECRET_LEN`], and [`Error::Conflict`] if the same secret is already stored.
pub async fn install_api_key<C>(
    db: &C,
    name: &str,
    secret: &str,
    expires_at: Option<DateTimeUtc>,
) -> Result<api_key::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let name = required_text("name", name)?;
    if secret.len() < MIN_SECRET_LEN {
        return Err(Error::validation(format!(
            "API key secrets need at least {MIN_SECRET_LEN} characters"
        )));
    }

    let key = api_key::ActiveModel {
        name: Set(name),
        key_hash: Set(hash_key(secret)),
        key_prefix: Set(key_prefix(secret)),
        is_active: Set(true),
        expires_at: Set(expires_at),
        last_used_at: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(key_id = key.id, name = %key.name, prefix = %key.key_prefix, "Stored API key");
    Ok(key)
}

/// Issues a key with a newly generated secret.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn issue_api_key<C>(db: &C, input: NewApiKey) -> Result<IssuedKey>
where
    C: ConnectionTrait + TransactionTrait,
{
    if let Some(expires_at) = input.expires_at
        && expires_at <= chrono::Utc::now()
    {
        return Err(Error::validation("expires_at must be in the future"));
    }
    let secret = generate_secret();
    let key = install_api_key(db, &input.name, &secret, input.expires_at).await?;
    Ok(IssuedKey { key, secret })
}

/// Installs the configured secret when no key exists yet.
///
/// Returns the stored key, or `None` when keys already exist.
pub async fn bootstrap_api_key<C>(db: &C, secret: &str) -> Result<Option<api_key::Model>>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = ApiKey::find().count(db).await?;
    if existing > 0 {
        debug!(existing, "API keys present, skipping bootstrap key");
        return Ok(None);
    }
    install_api_key(db, BOOTSTRAP_KEY_NAME, secret, None)
        .await
        .map(Some)
}

/// Checks a presented secret and records its use.
///
/// # Errors
/// Returns [`Error::Unauthorized`] for unknown, revoked or expired keys.
pub async fn authenticate<C>(db: &C, secret: &str) -> Result<api_key::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let key = ApiKey::find()
        .filter(api_key::Column::KeyHash.eq(hash_key(secret)))
        .one(db)
        .await?
        .ok_or(Error::Unauthorized)?;

    let now = chrono::Utc::now();
    if !key.is_active {
        warn!(key_id = key.id, "Rejected revoked API key");
        return Err(Error::Unauthorized);
    }
    if key.expires_at.is_some_and(|expires_at| expires_at <= now) {
        warn!(key_id = key.id, "Rejected expired API key");
        return Err(Error::Unauthorized);
    }

    let mut touched: api_key::ActiveModel = key.into();
    touched.last_used_at = Set(Some(now));
    touched.update(db).await.map_err(Into::into)
}

/// Revokes a key. Revoked keys stay listed but no longer authenticate.
pub async fn revoke_api_key<C>(db: &C, key_id: i64) -> Result<api_key::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = ApiKey::find_by_id(key_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("API key", key_id))?;

    let mut key: api_key::ActiveModel = existing.into();
    key.is_active = Set(false);
    let revoked = key.update(db).await?;
    info!(key_id, "Revoked API key");
    Ok(revoked)
}

/// Lists keys, oldest first.
pub async fn list_api_keys<C>(db: &C, page: Pagination) -> Result<Vec<api_key::Model>>
where
    C: ConnectionTrait,
{
    ApiKey::find()
        .order_by_asc(api_key::Column::Id)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}
