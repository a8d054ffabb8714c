//! Driver entity - Delivery staff who run routes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Driver database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drivers")]
pub struct Model {
    /// Unique identifier for the driver
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Employee code, unique
    #[sea_orm(unique)]
    pub employee_code: String,
    /// Full name
    pub name: String,
    /// Mobile phone number
    pub phone: Option<String>,
    /// Driving licence number
    pub license_number: Option<String>,
    /// Whether the driver can take a route today
    pub is_available: bool,
    /// Soft delete flag
    pub is_active: bool,
    /// When the driver was created
    pub created_at: DateTimeUtc,
}

/// `Driver` is referenced by vehicles, routes and deliveries but owns no foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
