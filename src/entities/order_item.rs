//! Order item entity - One product line of an order.
//!
//! The unit price is copied from the product when the order is created so later
//! price changes do not alter existing orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this item belongs to
    pub order_id: i64,
    /// Product ordered
    pub gas_product_id: i64,
    /// Number of cylinders (always positive)
    pub quantity: i32,
    /// Price per cylinder at order time
    pub unit_price: f64,
    /// Discount in percent (0-100)
    pub discount_percentage: f64,
    /// Discount in currency for this line
    pub discount_amount: f64,
    /// `quantity * unit_price - discount_amount`
    pub subtotal: f64,
    /// Whether the customer swaps empty cylinders for full ones
    pub is_exchange: bool,
    /// Empty cylinders the driver should collect
    pub empty_received: i32,
    /// When the item was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `OrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
    /// Each item references one product
    #[sea_orm(
        belongs_to = "super::gas_product::Entity",
        from = "Column::GasProductId",
        to = "super::gas_product::Column::Id"
    )]
    GasProduct,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::gas_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GasProduct.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
