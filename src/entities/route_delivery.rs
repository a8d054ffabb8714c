//! Route delivery entity - Execution record of one drop on a route.
//!
//! Where `route_stop` holds the plan, this row tracks what happened on the road:
//! arrival, hand-over or failure, and proof of delivery.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of a single drop
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DropStatus {
    /// Not yet visited
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Driver is at the address
    #[sea_orm(string_value = "arrived")]
    Arrived,
    /// Cylinders handed over
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Could not deliver
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl DropStatus {
    /// Returns true once the drop has an outcome.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }
}

/// Route delivery database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "route_deliveries")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Route the drop belongs to
    pub route_id: i64,
    /// Order being delivered
    pub order_id: i64,
    /// Mirrors the stop sequence
    pub sequence: i32,
    /// Drop outcome
    pub status: DropStatus,
    /// When the driver arrived
    pub arrived_at: Option<DateTimeUtc>,
    /// When the cylinders were handed over
    pub delivered_at: Option<DateTimeUtc>,
    /// Link to the captured signature
    pub signature_url: Option<String>,
    /// Link to the delivery photo
    pub photo_url: Option<String>,
    /// Driver notes (failure reason, gate code, ...)
    pub notes: Option<String>,
}

/// Defines relationships between `RouteDelivery` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each drop belongs to one route
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id",
        on_delete = "Cascade"
    )]
    Route,
    /// Each drop serves one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl ActiveModelBehavior for ActiveModel {}
