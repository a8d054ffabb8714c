//! Delivery entity - Proof that an order reached (or failed to reach) the customer.
//!
//! There is at most one delivery row per order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Final outcome of a delivery
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Cylinders handed over
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Hand-over did not happen
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Delivery database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deliveries")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order delivered, unique
    #[sea_orm(unique)]
    pub order_id: i64,
    /// Route that carried the order
    pub route_id: Option<i64>,
    /// Driver who made the delivery
    pub driver_id: Option<i64>,
    /// Vehicle used
    pub vehicle_id: Option<i64>,
    /// Outcome
    pub status: DeliveryStatus,
    /// Full cylinders handed over
    pub cylinders_delivered: i32,
    /// Empty cylinders taken back
    pub empties_collected: i32,
    /// Who received the cylinders
    pub recipient_name: Option<String>,
    /// Link to the captured signature
    pub signature_url: Option<String>,
    /// Link to the delivery photo
    pub photo_url: Option<String>,
    /// Driver notes
    pub notes: Option<String>,
    /// When the delivery happened
    pub delivered_at: DateTimeUtc,
}

/// Defines relationships between Delivery and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each delivery belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl ActiveModelBehavior for ActiveModel {}
