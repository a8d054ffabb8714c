//! Delivery history entity - Per-product record of what a customer received.
//!
//! One row is written for each order item when a delivery completes. These rows
//! are the raw material for consumption analysis and demand predictions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Delivery history database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_history")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer who received the cylinders
    pub customer_id: i64,
    /// Order the delivery fulfilled
    pub order_id: Option<i64>,
    /// Product delivered
    pub gas_product_id: i64,
    /// Driver who made the delivery
    pub driver_id: Option<i64>,
    /// Day of delivery
    pub delivery_date: Date,
    /// Full cylinders delivered
    pub quantity: i32,
    /// Empty cylinders collected
    pub empties_collected: i32,
    /// Amount charged for this line
    pub amount: f64,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `DeliveryHistory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// Each row references one product
    #[sea_orm(
        belongs_to = "super::gas_product::Entity",
        from = "Column::GasProductId",
        to = "super::gas_product::Column::Id"
    )]
    GasProduct,
}

impl ActiveModelBehavior for ActiveModel {}
