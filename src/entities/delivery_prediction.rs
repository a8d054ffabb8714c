//! Delivery prediction entity - Externally produced refill forecasts.
//!
//! Predictions arrive in batches identified by `prediction_batch_id`. The backend
//! stores and serves them; it does not compute them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Delivery prediction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_predictions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer expected to need a refill
    pub customer_id: i64,
    /// Product expected, if known
    pub gas_product_id: Option<i64>,
    /// Day the refill is expected
    pub predicted_date: Date,
    /// Cylinders expected
    pub predicted_quantity: i32,
    /// Model confidence between 0 and 1
    pub confidence_score: f64,
    /// Version tag of the producing model
    pub model_version: String,
    /// Batch the prediction was delivered in
    pub prediction_batch_id: String,
    /// Whether an order has been created from this prediction
    pub is_converted_to_order: bool,
    /// When the prediction was stored
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `DeliveryPrediction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each prediction concerns one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl ActiveModelBehavior for ActiveModel {}
