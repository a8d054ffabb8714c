//! API key entity - Credentials for machine and staff API access.
//!
//! Only the SHA-256 hash of the secret is stored; `key_hash` is unique. The short
//! `key_prefix` lets operators recognise a key without revealing it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// API key database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner-facing label, recorded as actor in audit logs
    pub name: String,
    /// Hex SHA-256 of the secret, unique
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub key_hash: String,
    /// First characters of the secret
    pub key_prefix: String,
    /// Revoked keys are kept but rejected
    pub is_active: bool,
    /// Keys past this instant are rejected
    pub expires_at: Option<DateTimeUtc>,
    /// Last successful authentication
    pub last_used_at: Option<DateTimeUtc>,
    /// When the key was issued
    pub created_at: DateTimeUtc,
}

/// `ApiKey` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
