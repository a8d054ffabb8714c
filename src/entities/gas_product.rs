//! Gas product entity - Cylinder sizes and their prices.
//!
//! Products are catalog entries (e.g. a 20 kg household cylinder). Order items copy
//! the unit price at the time of ordering.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gas product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gas_products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stock keeping unit, unique (e.g., "CYL-20")
    #[sea_orm(unique)]
    pub sku: String,
    /// Display name (e.g., "20kg Household Cylinder")
    pub name: String,
    /// Filled weight of gas in kilograms
    pub size_kg: f64,
    /// Price per cylinder refill
    pub unit_price: f64,
    /// Deposit charged for a new cylinder
    pub deposit_amount: f64,
    /// Unavailable products cannot be ordered
    pub is_available: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `GasProduct` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product appears in many order items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
