//! Customer inventory entity - Cylinders held at a customer site, per product.
//!
//! The pair (`customer_id`, `gas_product_id`) is unique. Counts are never negative and
//! `quantity_total` always equals `quantity_owned + quantity_rented`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer inventory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_inventories")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer holding the cylinders
    pub customer_id: i64,
    /// Product held
    pub gas_product_id: i64,
    /// Cylinders owned by the customer
    pub quantity_owned: i32,
    /// Cylinders rented from the distributor
    pub quantity_rented: i32,
    /// `quantity_owned + quantity_rented`
    pub quantity_total: i32,
    /// Last time cylinders of this product were delivered
    pub last_delivered_at: Option<DateTimeUtc>,
    /// When the row was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `CustomerInventory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// Each row references one product
    #[sea_orm(
        belongs_to = "super::gas_product::Entity",
        from = "Column::GasProductId",
        to = "super::gas_product::Column::Id"
    )]
    GasProduct,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
