//! Customer entity - Households and businesses that receive gas deliveries.
//!
//! Each customer has a unique code, a delivery address with optional coordinates,
//! a credit limit and an active flag. Inactive customers keep their history but
//! cannot place new orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of customer account
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    /// Private household
    #[sea_orm(string_value = "residential")]
    Residential,
    /// Restaurant, shop or office
    #[sea_orm(string_value = "commercial")]
    Commercial,
    /// Factory or other bulk consumer
    #[sea_orm(string_value = "industrial")]
    Industrial,
}

/// Customer database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business-facing customer code (e.g., "C-00123"), unique
    #[sea_orm(unique)]
    pub customer_code: String,
    /// Customer or company name
    pub name: String,
    /// Person to ask for on delivery
    pub contact_name: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Delivery address
    pub address: String,
    /// Delivery area used to group routes
    pub area: Option<String>,
    /// Latitude of the delivery address
    pub latitude: Option<f64>,
    /// Longitude of the delivery address
    pub longitude: Option<f64>,
    /// Account type
    pub customer_type: CustomerType,
    /// Maximum outstanding amount allowed
    pub credit_limit: f64,
    /// Whether the customer is on a recurring delivery plan
    pub is_subscription: bool,
    /// Soft delete flag - inactive customers cannot order
    pub is_active: bool,
    /// When the customer was created
    pub created_at: DateTimeUtc,
    /// When the customer was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One customer has one inventory row per product
    #[sea_orm(has_many = "super::customer_inventory::Entity")]
    Inventories,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::customer_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
