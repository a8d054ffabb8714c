//! Shared test utilities for the delivery backend.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        customer::{self, NewCustomer},
        driver::{self, NewDriver},
        gas_product::{self, NewGasProduct},
        order::{self, NewOrder, NewOrderItem},
        route::{self, AddRouteOrder, NewRoute},
        vehicle::{self, NewVehicle},
    },
    entities::{self, CustomerType, VehicleType},
    errors::Result,
};
use sea_orm::{DatabaseConnection, prelude::Date};
use uuid::Uuid;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Fixed delivery day used by test orders and routes.
pub fn test_date() -> Date {
    Date::from_ymd_opt(2024, 1, 15).unwrap_or_default()
}

fn unique_code(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..8])
}

/// Customer input with sensible defaults.
///
/// # Defaults
/// * `address`: a Taipei street address with coordinates
/// * `customer_type`: residential
/// * `credit_limit`: 0.0
pub fn new_customer_input(code: &str) -> NewCustomer {
    NewCustomer {
        customer_code: code.to_string(),
        name: format!("Customer {}", code.trim()),
        contact_name: None,
        phone: None,
        address: "No. 1, Section 1, Zhongxiao E. Rd".to_string(),
        area: Some("Zhongzheng".to_string()),
        latitude: Some(25.045),
        longitude: Some(121.52),
        customer_type: CustomerType::Residential,
        credit_limit: 0.0,
        is_subscription: false,
    }
}

/// Creates a test customer with sensible defaults.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    code: &str,
) -> Result<entities::customer::Model> {
    customer::create_customer(db, new_customer_input(code)).await
}

/// Creates an available test product.
pub async fn create_test_product(
    db: &DatabaseConnection,
    sku: &str,
    size_kg: f64,
    unit_price: f64,
) -> Result<entities::gas_product::Model> {
    gas_product::create_gas_product(
        db,
        NewGasProduct {
            sku: sku.to_string(),
            name: format!("{size_kg}kg cylinder"),
            size_kg,
            unit_price,
            deposit_amount: 0.0,
        },
    )
    .await
}

/// Creates an active, available test driver.
pub async fn create_test_driver(
    db: &DatabaseConnection,
    employee_code: &str,
) -> Result<entities::driver::Model> {
    driver::create_driver(
        db,
        NewDriver {
            employee_code: employee_code.to_string(),
            name: format!("Driver {employee_code}"),
            phone: None,
            license_number: None,
        },
    )
    .await
}

/// Creates an active test truck.
pub async fn create_test_vehicle(
    db: &DatabaseConnection,
    plate_number: &str,
    max_cylinders: i32,
) -> Result<entities::vehicle::Model> {
    vehicle::create_vehicle(
        db,
        NewVehicle {
            plate_number: plate_number.to_string(),
            vehicle_type: VehicleType::Truck,
            max_cylinders,
            max_weight_kg: None,
            last_maintenance: None,
        },
    )
    .await
}

/// Creates a pending single-line order for a fresh customer and product.
///
/// # Defaults
/// * product: 20kg at 700.0, no discount, not an exchange
/// * `scheduled_date`: [`test_date`]
pub async fn create_test_order(
    db: &DatabaseConnection,
    quantity: i32,
) -> Result<entities::order::Model> {
    let customer = create_test_customer(db, &unique_code("C")).await?;
    let product = create_test_product(db, &unique_code("GAS"), 20.0, 700.0).await?;
    let created = order::create_order(
        db,
        NewOrder {
            customer_id: customer.id,
            scheduled_date: test_date(),
            delivery_time_start: None,
            delivery_time_end: None,
            is_urgent: false,
            payment_method: None,
            delivery_notes: None,
            items: vec![NewOrderItem {
                gas_product_id: product.id,
                quantity,
                discount_percentage: 0.0,
                is_exchange: false,
                empty_received: 0,
            }],
        },
    )
    .await?;
    Ok(created.order)
}

/// Creates an empty planned route with no driver or vehicle.
pub async fn create_test_route(db: &DatabaseConnection) -> Result<entities::route::Model> {
    route::create_route(
        db,
        NewRoute {
            route_number: None,
            route_date: test_date(),
            area: None,
            driver_id: None,
            vehicle_id: None,
            estimated_duration_minutes: 0,
        },
    )
    .await
}

/// Creates a planned route with a driver, a large truck and the given orders.
/// The returned model reflects the route after all orders were added.
pub async fn create_ready_route(
    db: &DatabaseConnection,
    order_ids: &[i64],
) -> Result<entities::route::Model> {
    let driver = create_test_driver(db, &unique_code("D")).await?;
    let vehicle = create_test_vehicle(db, &unique_code("TRK"), 500).await?;
    let mut planned = route::create_route(
        db,
        NewRoute {
            route_number: None,
            route_date: test_date(),
            area: None,
            driver_id: Some(driver.id),
            vehicle_id: Some(vehicle.id),
            estimated_duration_minutes: 240,
        },
    )
    .await?;

    for &order_id in order_ids {
        planned = route::add_order_to_route(
            db,
            planned.id,
            AddRouteOrder {
                order_id,
                latitude: None,
                longitude: None,
                distance_from_previous_km: Some(1.0),
                estimated_arrival: None,
            },
        )
        .await?
        .route;
    }
    Ok(planned)
}
