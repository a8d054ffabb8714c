//! Route entity - A day's delivery run for one driver and vehicle.
//!
//! `total_distance_km`, `optimization_score` and `is_optimized` are stored as given;
//! no optimizer computes them. Stop counters are maintained by the route and
//! delivery services.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a route
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    /// Being put together
    #[sea_orm(string_value = "planned")]
    Planned,
    /// Sequence supplied by an external planner
    #[sea_orm(string_value = "optimized")]
    Optimized,
    /// Driver is on the road
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// All drops resolved
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Abandoned before completion
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl RouteStatus {
    /// Stops may be added, removed or reordered only before the route starts.
    #[must_use]
    pub const fn is_planning(self) -> bool {
        matches!(self, Self::Planned | Self::Optimized)
    }

    /// Whether a route in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Planned, Self::Optimized)
            | (Self::Planned | Self::Optimized, Self::InProgress)
            | (Self::InProgress, Self::Completed)
            | (Self::Planned | Self::Optimized | Self::InProgress, Self::Cancelled) => true,
            _ => false,
        }
    }
}

/// Route database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "routes")]
pub struct Model {
    /// Unique identifier for the route
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing route number, unique
    #[sea_orm(unique)]
    pub route_number: String,
    /// Day the route runs
    pub route_date: Date,
    /// Delivery area covered
    pub area: Option<String>,
    /// Assigned driver
    pub driver_id: Option<i64>,
    /// Assigned vehicle
    pub vehicle_id: Option<i64>,
    /// Lifecycle status
    pub status: RouteStatus,
    /// Number of drops on the route
    pub total_stops: i32,
    /// Number of drops resolved (delivered)
    pub completed_stops: i32,
    /// Planned distance in kilometres
    pub total_distance_km: f64,
    /// Planned duration in minutes
    pub estimated_duration_minutes: i32,
    /// Quality score reported by an external planner
    pub optimization_score: Option<f64>,
    /// Whether the sequence came from an external planner
    pub is_optimized: bool,
    /// When the driver started the route
    pub started_at: Option<DateTimeUtc>,
    /// When the route was completed
    pub completed_at: Option<DateTimeUtc>,
    /// When the route was created
    pub created_at: DateTimeUtc,
    /// When the route was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Route and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each route may have one driver
    #[sea_orm(
        belongs_to = "super::driver::Entity",
        from = "Column::DriverId",
        to = "super::driver::Column::Id"
    )]
    Driver,
    /// Each route may use one vehicle
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
    /// One route has many stops
    #[sea_orm(has_many = "super::route_stop::Entity")]
    Stops,
}

impl Related<super::route_stop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stops.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
