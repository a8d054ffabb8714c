//! Vehicle entity - Trucks, vans and motorcycles used for deliveries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of delivery vehicle
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    /// Flatbed truck
    #[sea_orm(string_value = "truck")]
    Truck,
    /// Closed van
    #[sea_orm(string_value = "van")]
    Van,
    /// Motorcycle for small cylinders
    #[sea_orm(string_value = "motorcycle")]
    Motorcycle,
}

/// Vehicle database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    /// Unique identifier for the vehicle
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Licence plate, unique
    #[sea_orm(unique)]
    pub plate_number: String,
    /// Vehicle kind
    pub vehicle_type: VehicleType,
    /// Number of cylinders the vehicle can carry
    pub max_cylinders: i32,
    /// Payload limit in kilograms
    pub max_weight_kg: Option<f64>,
    /// Driver the vehicle is assigned to
    pub driver_id: Option<i64>,
    /// Soft delete flag
    pub is_active: bool,
    /// Date of the last maintenance
    pub last_maintenance: Option<Date>,
    /// When the vehicle was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Vehicle and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each vehicle may be assigned to one driver
    #[sea_orm(
        belongs_to = "super::driver::Entity",
        from = "Column::DriverId",
        to = "super::driver::Column::Id"
    )]
    Driver,
}

impl Related<super::driver::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
