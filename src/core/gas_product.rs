//! Gas product business logic - Cylinder catalog management.
//!
//! Products are seeded from the TOML catalog at startup and can be edited through the
//! API afterwards. The SKU is the stable key; seeding never overwrites an existing SKU.

use crate::{
    config::Catalog,
    core::{Pagination, non_negative_amount, required_text},
    entities::{GasProduct, gas_product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct NewGasProduct {
    /// Stock keeping unit, unique
    pub sku: String,
    /// Display name
    pub name: String,
    /// Cylinder size in kilograms
    pub size_kg: f64,
    /// Price per cylinder
    pub unit_price: f64,
    /// Deposit charged for a new cylinder
    #[serde(default)]
    pub deposit_amount: f64,
}

/// Partial update of a product
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GasProductUpdate {
    /// New display name
    pub name: Option<String>,
    /// New unit price
    pub unit_price: Option<f64>,
    /// New deposit amount
    pub deposit_amount: Option<f64>,
    /// Whether the product can be ordered
    pub is_available: Option<bool>,
}

fn positive_size(size_kg: f64) -> Result<f64> {
    if !size_kg.is_finite() || size_kg <= 0.0 {
        return Err(Error::validation(format!(
            "size_kg must be greater than zero, got {size_kg}"
        )));
    }
    Ok(size_kg)
}

/// Creates a new product.
///
/// # Errors
/// Returns an error for blank SKU/name, non-positive size, negative prices or a
/// duplicate SKU ([`Error::Conflict`]).
#[instrument(skip(db, input), fields(sku = %input.sku))]
pub async fn create_gas_product<C>(db: &C, input: NewGasProduct) -> Result<gas_product::Model>
where
    C: ConnectionTrait,
{
    let sku = required_text("sku", &input.sku)?;
    let name = required_text("name", &input.name)?;
    let size_kg = positive_size(input.size_kg)?;
    let unit_price = non_negative_amount("unit_price", input.unit_price)?;
    let deposit_amount = non_negative_amount("deposit_amount", input.deposit_amount)?;

    let now = chrono::Utc::now();
    let product = gas_product::ActiveModel {
        sku: Set(sku),
        name: Set(name),
        size_kg: Set(size_kg),
        unit_price: Set(unit_price),
        deposit_amount: Set(deposit_amount),
        is_available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = product.insert(db).await?;
    info!(product_id = created.id, "Created gas product");
    Ok(created)
}

/// Finds a product by ID.
pub async fn get_gas_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<gas_product::Model>>
where
    C: ConnectionTrait,
{
    GasProduct::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by SKU.
pub async fn get_gas_product_by_sku<C>(db: &C, sku: &str) -> Result<Option<gas_product::Model>>
where
    C: ConnectionTrait,
{
    GasProduct::find()
        .filter(gas_product::Column::Sku.eq(sku.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists products ordered by size, optionally only the orderable ones.
pub async fn list_gas_products<C>(
    db: &C,
    available_only: bool,
    page: Pagination,
) -> Result<Vec<gas_product::Model>>
where
    C: ConnectionTrait,
{
    GasProduct::find()
        .apply_if(available_only.then_some(true), |q, available| {
            q.filter(gas_product::Column::IsAvailable.eq(available))
        })
        .order_by_asc(gas_product::Column::SizeKg)
        .order_by_asc(gas_product::Column::Sku)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates price, name or availability of a product.
#[instrument(skip(db, update))]
pub async fn update_gas_product<C>(
    db: &C,
    product_id: i64,
    update: GasProductUpdate,
) -> Result<gas_product::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = get_gas_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("gas product", product_id))?;

    let mut product: gas_product::ActiveModel = existing.into();
    if let Some(name) = update.name {
        product.name = Set(required_text("name", &name)?);
    }
    if let Some(price) = update.unit_price {
        product.unit_price = Set(non_negative_amount("unit_price", price)?);
    }
    if let Some(deposit) = update.deposit_amount {
        product.deposit_amount = Set(non_negative_amount("deposit_amount", deposit)?);
    }
    if let Some(available) = update.is_available {
        product.is_available = Set(available);
    }
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Inserts catalog products whose SKU is not in the database yet.
///
/// Returns the number of products inserted.
pub async fn seed_gas_products<C>(db: &C, catalog: &Catalog) -> Result<usize>
where
    C: ConnectionTrait + TransactionTrait,
{
    let mut inserted = 0;
    for product in &catalog.products {
        if get_gas_product_by_sku(db, &product.sku).await?.is_some() {
            continue;
        }
        create_gas_product(
            db,
            NewGasProduct {
                sku: product.sku.clone(),
                name: product.name.clone(),
                size_kg: product.size_kg,
                unit_price: product.unit_price,
                deposit_amount: product.deposit_amount,
            },
        )
        .await?;
        inserted += 1;
    }
    if inserted > 0 {
        info!(inserted, "Seeded gas products from catalog");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::ProductConfig;
    use crate::test_utils::*;

    fn catalog_entry(sku: &str, size_kg: f64, unit_price: f64) -> ProductConfig {
        ProductConfig {
            sku: sku.to_string(),
            name: format!("{size_kg}kg cylinder"),
            size_kg,
            unit_price,
            deposit_amount: 0.0,
        }
    }

    #[tokio::test]
    async fn test_create_product_rejects_bad_input() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_gas_product(
            &db,
            NewGasProduct {
                sku: "GAS-20".to_string(),
                name: "20kg".to_string(),
                size_kg: 0.0,
                unit_price: 700.0,
                deposit_amount: 0.0,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_gas_product(
            &db,
            NewGasProduct {
                sku: "GAS-20".to_string(),
                name: "20kg".to_string(),
                size_kg: 20.0,
                unit_price: -1.0,
                deposit_amount: 0.0,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = Catalog {
            products: vec![
                catalog_entry("GAS-20", 20.0, 720.0),
                catalog_entry("GAS-50", 50.0, 1750.0),
            ],
        };

        assert_eq!(seed_gas_products(&db, &catalog).await?, 2);
        assert_eq!(seed_gas_products(&db, &catalog).await?, 0);

        let products = list_gas_products(&db, false, Pagination::default()).await?;
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].sku, "GAS-20");

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_keeps_edited_prices() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "GAS-16", 16.0, 600.0).await?;
        update_gas_product(
            &db,
            product.id,
            GasProductUpdate {
                unit_price: Some(650.0),
                ..Default::default()
            },
        )
        .await?;

        let catalog = Catalog {
            products: vec![catalog_entry("GAS-16", 16.0, 600.0)],
        };
        assert_eq!(seed_gas_products(&db, &catalog).await?, 0);

        let stored = get_gas_product_by_sku(&db, "GAS-16").await?.unwrap();
        assert_eq!(stored.unit_price, 650.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_available_only() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "GAS-4", 4.0, 250.0).await?;
        let retired = create_test_product(&db, "GAS-10", 10.0, 400.0).await?;
        update_gas_product(
            &db,
            retired.id,
            GasProductUpdate {
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await?;

        let available = list_gas_products(&db, true, Pagination::default()).await?;
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].sku, "GAS-4");

        Ok(())
    }
}
