//! User entity - Staff and portal accounts.
//!
//! Users carry a role that decides what they may do in the back office. Credentials
//! are not stored here; API callers authenticate with keys (see `api_key`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user account
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access across the system
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    /// Manages drivers, routes and pricing
    #[sea_orm(string_value = "manager")]
    Manager,
    /// Takes orders and maintains customers
    #[sea_orm(string_value = "office_staff")]
    OfficeStaff,
    /// Executes routes
    #[sea_orm(string_value = "driver")]
    Driver,
    /// Customer portal account
    #[sea_orm(string_value = "customer")]
    Customer,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across the system
    #[sea_orm(unique)]
    pub username: String,
    /// Contact email, unique across the system
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Access role
    pub role: UserRole,
    /// Deactivated users are kept for audit history
    pub is_active: bool,
    /// When the user was created
    pub created_at: DateTimeUtc,
    /// When the user was last modified
    pub updated_at: DateTimeUtc,
}

/// `User` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
