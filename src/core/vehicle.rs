//! Vehicle business logic - Fleet records and driver assignment.

use crate::{
    core::{Pagination, driver::require_active_driver, required_text},
    entities::{Vehicle, VehicleType, vehicle},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for registering a vehicle
#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    /// License plate, unique
    pub plate_number: String,
    /// Vehicle kind
    pub vehicle_type: VehicleType,
    /// Number of cylinders the vehicle can carry
    pub max_cylinders: i32,
    /// Load limit in kilograms
    pub max_weight_kg: Option<f64>,
    /// Last maintenance day
    pub last_maintenance: Option<Date>,
}

/// Registers a vehicle.
///
/// # Errors
/// Returns [`Error::InvalidQuantity`] if `max_cylinders` is not positive.
#[instrument(skip(db, input), fields(plate = %input.plate_number))]
pub async fn create_vehicle<C>(db: &C, input: NewVehicle) -> Result<vehicle::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    if input.max_cylinders <= 0 {
        return Err(Error::InvalidQuantity {
            field: "max_cylinders",
            quantity: i64::from(input.max_cylinders),
        });
    }
    if let Some(weight) = input.max_weight_kg
        && (!weight.is_finite() || weight <= 0.0)
    {
        return Err(Error::validation(format!(
            "max_weight_kg must be greater than zero, got {weight}"
        )));
    }

    let vehicle = vehicle::ActiveModel {
        plate_number: Set(required_text("plate_number", &input.plate_number)?),
        vehicle_type: Set(input.vehicle_type),
        max_cylinders: Set(input.max_cylinders),
        max_weight_kg: Set(input.max_weight_kg),
        driver_id: Set(None),
        is_active: Set(true),
        last_maintenance: Set(input.last_maintenance),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = vehicle.insert(db).await?;
    info!(vehicle_id = created.id, "Registered vehicle");
    Ok(created)
}

/// Finds a vehicle by ID.
pub async fn get_vehicle_by_id<C>(db: &C, vehicle_id: i64) -> Result<Option<vehicle::Model>>
where
    C: ConnectionTrait,
{
    Vehicle::find_by_id(vehicle_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a vehicle that exists and is active.
pub async fn require_active_vehicle<C>(db: &C, vehicle_id: i64) -> Result<vehicle::Model>
where
    C: ConnectionTrait,
{
    match get_vehicle_by_id(db, vehicle_id).await? {
        Some(vehicle) if vehicle.is_active => Ok(vehicle),
        _ => Err(Error::not_found("vehicle", vehicle_id)),
    }
}

/// Lists active vehicles by plate.
pub async fn list_vehicles<C>(
    db: &C,
    vehicle_type: Option<VehicleType>,
    page: Pagination,
) -> Result<Vec<vehicle::Model>>
where
    C: ConnectionTrait,
{
    Vehicle::find()
        .filter(vehicle::Column::IsActive.eq(true))
        .apply_if(vehicle_type, |q, kind| {
            q.filter(vehicle::Column::VehicleType.eq(kind))
        })
        .order_by_asc(vehicle::Column::PlateNumber)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Assigns a driver to a vehicle, or clears the assignment with `None`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the vehicle is missing or the driver is missing or
/// inactive.
#[instrument(skip(db))]
pub async fn assign_vehicle_driver<C>(
    db: &C,
    vehicle_id: i64,
    driver_id: Option<i64>,
) -> Result<vehicle::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = require_active_vehicle(db, vehicle_id).await?;
    if let Some(driver_id) = driver_id {
        require_active_driver(db, driver_id).await?;
    }

    let mut vehicle: vehicle::ActiveModel = existing.into();
    vehicle.driver_id = Set(driver_id);
    vehicle.update(db).await.map_err(Into::into)
}
