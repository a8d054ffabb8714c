//! Route stop entity - Planned position of an order within a route.
//!
//! `stop_sequence` is 1-based and unique within a route.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Route stop database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "route_stops")]
pub struct Model {
    /// Unique identifier for the stop
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Route the stop belongs to
    pub route_id: i64,
    /// Order delivered at this stop
    pub order_id: i64,
    /// 1-based position on the route
    pub stop_sequence: i32,
    /// Latitude copied from the customer
    pub latitude: Option<f64>,
    /// Longitude copied from the customer
    pub longitude: Option<f64>,
    /// Leg distance from the previous stop
    pub distance_from_previous_km: Option<f64>,
    /// Planned arrival time
    pub estimated_arrival: Option<DateTimeUtc>,
    /// Recorded arrival time
    pub actual_arrival: Option<DateTimeUtc>,
    /// Whether the drop at this stop was delivered
    pub is_completed: bool,
}

/// Defines relationships between `RouteStop` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each stop belongs to one route
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id",
        on_delete = "Cascade"
    )]
    Route,
    /// Each stop serves one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
