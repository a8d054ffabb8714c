//! Database configuration module.
//!
//! This module handles connecting to PostgreSQL (production) or `SQLite` (local runs and
//! tests) through `SeaORM`, and creating all tables from the entity definitions with
//! `Schema::create_table_from_entity`. Table creation is idempotent so it runs on every
//! startup.

use crate::config::AppConfig;
use crate::entities::{
    ApiKey, AuditLog, Customer, CustomerInventory, Delivery, DeliveryHistory,
    DeliveryPrediction, Driver, GasProduct, Order, OrderItem, Route, RouteDelivery, RouteStop,
    User, Vehicle, WebhookLog, customer_inventory, route_delivery, route_stop,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{info, warn};

/// Connects to the configured database, retrying on failure.
///
/// Up to `db_connect_retries` attempts are made, sleeping `db_retry_delay` between them.
pub async fn connect(config: &AppConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .sqlx_logging(false);

    let mut attempt = 1;
    loop {
        match Database::connect(options.clone()).await {
            Ok(db) => {
                info!(attempt, "Connected to database");
                return Ok(db);
            }
            Err(e) if attempt < config.db_connect_retries => {
                warn!(
                    attempt,
                    max_attempts = config.db_connect_retries,
                    "Database connection failed, retrying: {e}"
                );
                tokio::time::sleep(config.db_retry_delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

fn composite_unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_customer_inventories_customer_product")
            .table(CustomerInventory)
            .col(customer_inventory::Column::CustomerId)
            .col(customer_inventory::Column::GasProductId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_route_stops_route_sequence")
            .table(RouteStop)
            .col(route_stop::Column::RouteId)
            .col(route_stop::Column::StopSequence)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_route_deliveries_route_order")
            .table(RouteDelivery)
            .col(route_delivery::Column::RouteId)
            .col(route_delivery::Column::OrderId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates all tables and composite indexes if they do not exist yet.
///
/// Tables are created parents-first so foreign keys resolve on PostgreSQL.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Customer).await?;
    create_table(db, &schema, GasProduct).await?;
    create_table(db, &schema, Driver).await?;
    create_table(db, &schema, Vehicle).await?;
    create_table(db, &schema, Route).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;
    create_table(db, &schema, RouteStop).await?;
    create_table(db, &schema, RouteDelivery).await?;
    create_table(db, &schema, Delivery).await?;
    create_table(db, &schema, DeliveryHistory).await?;
    create_table(db, &schema, CustomerInventory).await?;
    create_table(db, &schema, DeliveryPrediction).await?;
    create_table(db, &schema, AuditLog).await?;
    create_table(db, &schema, WebhookLog).await?;
    create_table(db, &schema, ApiKey).await?;

    for index in composite_unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables ensured");
    Ok(())
}
