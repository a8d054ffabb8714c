//! Audit log entity - Who changed what, and when.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of change recorded
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Record created
    #[sea_orm(string_value = "create")]
    Create,
    /// Record fields changed
    #[sea_orm(string_value = "update")]
    Update,
    /// Record removed or deactivated
    #[sea_orm(string_value = "delete")]
    Delete,
    /// Lifecycle status changed
    #[sea_orm(string_value = "status_change")]
    StatusChange,
}

/// Audit log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the API key (or `"system"`) that made the change
    pub actor: String,
    /// Kind of change
    pub action: AuditAction,
    /// Table-level entity name, e.g. `"order"`
    pub entity_type: String,
    /// Primary key of the changed record
    pub entity_id: i64,
    /// Free-form JSON describing the change
    pub details: Option<Json>,
    /// When the change happened
    pub created_at: DateTimeUtc,
}

/// `AuditLog` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
