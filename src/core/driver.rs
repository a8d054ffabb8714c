//! Driver business logic - Driver records and daily availability.

use crate::{
    core::{Pagination, optional_text, required_text},
    entities::{Driver, driver},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for creating a driver
#[derive(Debug, Clone, Deserialize)]
pub struct NewDriver {
    /// Employee code, unique
    pub employee_code: String,
    /// Full name
    pub name: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Driving license number
    pub license_number: Option<String>,
}

/// Creates a new driver, available and active.
#[instrument(skip(db, input), fields(code = %input.employee_code))]
pub async fn create_driver<C>(db: &C, input: NewDriver) -> Result<driver::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let driver = driver::ActiveModel {
        employee_code: Set(required_text("employee_code", &input.employee_code)?),
        name: Set(required_text("name", &input.name)?),
        phone: Set(optional_text(input.phone)),
        license_number: Set(optional_text(input.license_number)),
        is_available: Set(true),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = driver.insert(db).await?;
    info!(driver_id = created.id, "Created driver");
    Ok(created)
}

/// Finds a driver by ID.
pub async fn get_driver_by_id<C>(db: &C, driver_id: i64) -> Result<Option<driver::Model>>
where
    C: ConnectionTrait,
{
    Driver::find_by_id(driver_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a driver that exists and is active.
///
/// # Errors
/// Returns [`Error::NotFound`] for missing or deactivated drivers.
pub async fn require_active_driver<C>(db: &C, driver_id: i64) -> Result<driver::Model>
where
    C: ConnectionTrait,
{
    match get_driver_by_id(db, driver_id).await? {
        Some(driver) if driver.is_active => Ok(driver),
        _ => Err(Error::not_found("driver", driver_id)),
    }
}

/// Lists active drivers by employee code, optionally filtered on availability.
pub async fn list_drivers<C>(
    db: &C,
    available: Option<bool>,
    page: Pagination,
) -> Result<Vec<driver::Model>>
where
    C: ConnectionTrait,
{
    Driver::find()
        .filter(driver::Column::IsActive.eq(true))
        .apply_if(available, |q, available| {
            q.filter(driver::Column::IsAvailable.eq(available))
        })
        .order_by_asc(driver::Column::EmployeeCode)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a driver available or unavailable for planning.
pub async fn set_driver_availability<C>(
    db: &C,
    driver_id: i64,
    is_available: bool,
) -> Result<driver::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = require_active_driver(db, driver_id).await?;
    let mut driver: driver::ActiveModel = existing.into();
    driver.is_available = Set(is_available);
    driver.update(db).await.map_err(Into::into)
}

/// Deactivates a driver. Inactive drivers cannot be assigned to routes or vehicles.
pub async fn deactivate_driver<C>(db: &C, driver_id: i64) -> Result<driver::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = get_driver_by_id(db, driver_id)
        .await?
        .ok_or_else(|| Error::not_found("driver", driver_id))?;

    let mut driver: driver::ActiveModel = existing.into();
    driver.is_active = Set(false);
    driver.is_available = Set(false);
    let updated = driver.update(db).await?;
    info!(driver_id, "Deactivated driver");
    Ok(updated)
}
