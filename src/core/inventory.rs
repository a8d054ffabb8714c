//! Customer inventory - Cylinders held at each customer site.
//!
//! Rows are created lazily: the first delivery or manual adjustment of a product for a
//! customer inserts the row, later changes update it.

use crate::{
    core::{customer::get_customer_by_id, gas_product::get_gas_product_by_id},
    entities::{CustomerInventory, customer_inventory},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{debug, instrument};

/// New counts for one product at a customer; absent values are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryAdjustment {
    /// Cylinders owned by the customer
    pub quantity_owned: Option<i32>,
    /// Cylinders rented from the distributor
    pub quantity_rented: Option<i32>,
}

fn non_negative_count(field: &'static str, quantity: i32) -> Result<i32> {
    if quantity < 0 {
        return Err(Error::InvalidQuantity {
            field,
            quantity: i64::from(quantity),
        });
    }
    Ok(quantity)
}

fn checked_sum(field: &'static str, a: i32, b: i32) -> Result<i32> {
    a.checked_add(b).ok_or(Error::InvalidQuantity {
        field,
        quantity: i64::from(a) + i64::from(b),
    })
}

/// Inventory rows of a customer, ordered by product.
pub async fn get_customer_inventory<C>(
    db: &C,
    customer_id: i64,
) -> Result<Vec<customer_inventory::Model>>
where
    C: ConnectionTrait,
{
    if get_customer_by_id(db, customer_id).await?.is_none() {
        return Err(Error::not_found("customer", customer_id));
    }
    CustomerInventory::find()
        .filter(customer_inventory::Column::CustomerId.eq(customer_id))
        .order_by_asc(customer_inventory::Column::GasProductId)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_row<C>(
    db: &C,
    customer_id: i64,
    gas_product_id: i64,
) -> Result<Option<customer_inventory::Model>>
where
    C: ConnectionTrait,
{
    CustomerInventory::find()
        .filter(customer_inventory::Column::CustomerId.eq(customer_id))
        .filter(customer_inventory::Column::GasProductId.eq(gas_product_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sets the owned and/or rented counts of a product at a customer.
///
/// # Errors
/// Returns [`Error::InvalidQuantity`] for negative counts or a total that does not fit an
/// `i32`, and [`Error::NotFound`] if the customer or product does not exist.
#[instrument(skip(db, adjustment))]
pub async fn adjust_inventory<C>(
    db: &C,
    customer_id: i64,
    gas_product_id: i64,
    adjustment: InventoryAdjustment,
) -> Result<customer_inventory::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let owned = adjustment
        .quantity_owned
        .map(|q| non_negative_count("quantity_owned", q))
        .transpose()?;
    let rented = adjustment
        .quantity_rented
        .map(|q| non_negative_count("quantity_rented", q))
        .transpose()?;

    if get_customer_by_id(db, customer_id).await?.is_none() {
        return Err(Error::not_found("customer", customer_id));
    }
    if get_gas_product_by_id(db, gas_product_id).await?.is_none() {
        return Err(Error::not_found("gas product", gas_product_id));
    }

    let now = chrono::Utc::now();
    let adjusted = match find_row(db, customer_id, gas_product_id).await? {
        Some(existing) => {
            let owned = owned.unwrap_or(existing.quantity_owned);
            let rented = rented.unwrap_or(existing.quantity_rented);
            let total = checked_sum("quantity_total", owned, rented)?;
            let mut row: customer_inventory::ActiveModel = existing.into();
            row.quantity_owned = Set(owned);
            row.quantity_rented = Set(rented);
            row.quantity_total = Set(total);
            row.updated_at = Set(now);
            row.update(db).await?
        }
        None => {
            let owned = owned.unwrap_or(0);
            let rented = rented.unwrap_or(0);
            let total = checked_sum("quantity_total", owned, rented)?;
            customer_inventory::ActiveModel {
                customer_id: Set(customer_id),
                gas_product_id: Set(gas_product_id),
                quantity_owned: Set(owned),
                quantity_rented: Set(rented),
                quantity_total: Set(total),
                last_delivered_at: Set(None),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    debug!(
        customer_id,
        gas_product_id,
        total = adjusted.quantity_total,
        "Adjusted customer inventory"
    );
    Ok(adjusted)
}

/// Books delivered cylinders into the customer's inventory.
///
/// Exchanges swap empties for full cylinders and leave the counts unchanged; other
/// deliveries add to the owned count. Either way the delivery time is recorded.
pub(crate) async fn apply_delivered_cylinders<C>(
    db: &C,
    customer_id: i64,
    gas_product_id: i64,
    quantity: i32,
    is_exchange: bool,
    delivered_at: DateTimeUtc,
) -> Result<customer_inventory::Model>
where
    C: ConnectionTrait,
{
    let added = if is_exchange {
        0
    } else {
        non_negative_count("quantity", quantity)?
    };

    match find_row(db, customer_id, gas_product_id).await? {
        Some(existing) => {
            let owned = checked_sum("quantity_owned", existing.quantity_owned, added)?;
            let total = checked_sum("quantity_total", owned, existing.quantity_rented)?;
            let mut row: customer_inventory::ActiveModel = existing.into();
            row.quantity_owned = Set(owned);
            row.quantity_total = Set(total);
            row.last_delivered_at = Set(Some(delivered_at));
            row.updated_at = Set(delivered_at);
            row.update(db).await.map_err(Into::into)
        }
        None => customer_inventory::ActiveModel {
            customer_id: Set(customer_id),
            gas_product_id: Set(gas_product_id),
            quantity_owned: Set(added),
            quantity_rented: Set(0),
            quantity_total: Set(added),
            last_delivered_at: Set(Some(delivered_at)),
            updated_at: Set(delivered_at),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(Into::into),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_adjust_creates_then_updates() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-1").await?;
        let product = create_test_product(&db, "GAS-20", 20.0, 700.0).await?;

        let created = adjust_inventory(
            &db,
            customer.id,
            product.id,
            InventoryAdjustment {
                quantity_owned: Some(2),
                quantity_rented: Some(1),
            },
        )
        .await?;
        assert_eq!(created.quantity_total, 3);

        let updated = adjust_inventory(
            &db,
            customer.id,
            product.id,
            InventoryAdjustment {
                quantity_owned: None,
                quantity_rented: Some(4),
            },
        )
        .await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.quantity_owned, 2);
        assert_eq!(updated.quantity_total, 6);

        let rows = get_customer_inventory(&db, customer.id).await?;
        assert_eq!(rows.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_adjustment_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-2").await?;
        let product = create_test_product(&db, "GAS-20", 20.0, 700.0).await?;

        let result = adjust_inventory(
            &db,
            customer.id,
            product.id,
            InventoryAdjustment {
                quantity_owned: Some(-1),
                quantity_rented: None,
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity {
                field: "quantity_owned",
                quantity: -1
            }
        ));
        assert!(get_customer_inventory(&db, customer.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-3").await?;
        let result =
            adjust_inventory(&db, customer.id, 404, InventoryAdjustment::default()).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_delivered_cylinders_added_unless_exchange() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-4").await?;
        let product = create_test_product(&db, "GAS-20", 20.0, 700.0).await?;
        let now = chrono::Utc::now();

        let row = apply_delivered_cylinders(&db, customer.id, product.id, 2, false, now).await?;
        assert_eq!(row.quantity_owned, 2);

        let row = apply_delivered_cylinders(&db, customer.id, product.id, 3, true, now).await?;
        assert_eq!(row.quantity_owned, 2);
        assert_eq!(row.quantity_total, 2);
        assert!(row.last_delivered_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_adjustment_total_overflow_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-5").await?;
        let product = create_test_product(&db, "GAS-20", 20.0, 700.0).await?;

        let result = adjust_inventory(
            &db,
            customer.id,
            product.id,
            InventoryAdjustment {
                quantity_owned: Some(i32::MAX),
                quantity_rented: Some(1),
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity {
                field: "quantity_total",
                ..
            }
        ));
        assert!(get_customer_inventory(&db, customer.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delivered_cylinders_overflow_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-6").await?;
        let product = create_test_product(&db, "GAS-20", 20.0, 700.0).await?;
        adjust_inventory(
            &db,
            customer.id,
            product.id,
            InventoryAdjustment {
                quantity_owned: Some(i32::MAX),
                quantity_rented: Some(0),
            },
        )
        .await?;

        let result =
            apply_delivered_cylinders(&db, customer.id, product.id, 1, false, chrono::Utc::now())
                .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity {
                field: "quantity_owned",
                ..
            }
        ));

        let rows = get_customer_inventory(&db, customer.id).await?;
        assert_eq!(rows[0].quantity_owned, i32::MAX);
        Ok(())
    }
}
