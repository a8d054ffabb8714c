//! Delivery predictions - Storage for externally produced demand forecasts.
//!
//! Forecasts arrive in batches from an outside model. They are validated and stored
//! as-is; the office later marks a prediction converted once it was turned into an
//! order.

use crate::{
    core::{
        Pagination, customer::get_customer_by_id, gas_product::get_gas_product_by_id,
        required_text,
    },
    entities::{DeliveryPrediction, delivery_prediction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// One forecast
#[derive(Debug, Clone, Deserialize)]
pub struct NewPrediction {
    /// Customer expected to need gas
    pub customer_id: i64,
    /// Product expected, if the model predicts one
    pub gas_product_id: Option<i64>,
    /// Day the customer is expected to run out
    pub predicted_date: Date,
    /// Cylinders expected
    pub predicted_quantity: i32,
    /// Model confidence in `0..=1`
    pub confidence_score: f64,
}

/// A batch of forecasts produced by one model run
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionBatch {
    /// Batch identifier; generated when absent
    pub batch_id: Option<String>,
    /// Version of the model that produced the batch
    pub model_version: String,
    /// Forecasts, at least one
    pub predictions: Vec<NewPrediction>,
}

/// Optional filters for listing predictions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionFilter {
    /// Only this batch
    pub batch_id: Option<String>,
    /// Only this customer
    pub customer_id: Option<i64>,
    /// Predicted on or after this day
    pub date_from: Option<Date>,
    /// Predicted on or before this day
    pub date_to: Option<Date>,
    /// Only converted (`true`) or open (`false`) predictions
    pub converted: Option<bool>,
}

fn validate_prediction(prediction: &NewPrediction) -> Result<()> {
    if prediction.predicted_quantity <= 0 {
        return Err(Error::InvalidQuantity {
            field: "predicted_quantity",
            quantity: i64::from(prediction.predicted_quantity),
        });
    }
    let score = prediction.confidence_score;
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(Error::validation(format!(
            "confidence_score must be between 0 and 1, got {score}"
        )));
    }
    Ok(())
}

/// Stores a batch of predictions in one transaction.
///
/// # Errors
/// Returns an error if the batch is empty, any prediction is invalid, or a referenced
/// customer or product does not exist. Nothing is stored in that case.
#[instrument(skip(db, batch), fields(count = batch.predictions.len()))]
pub async fn store_prediction_batch<C>(
    db: &C,
    batch: PredictionBatch,
) -> Result<Vec<delivery_prediction::Model>>
where
    C: ConnectionTrait + TransactionTrait,
{
    if batch.predictions.is_empty() {
        return Err(Error::validation("a prediction batch needs at least one entry"));
    }
    let model_version = required_text("model_version", &batch.model_version)?;
    for prediction in &batch.predictions {
        validate_prediction(prediction)?;
    }
    let batch_id = match batch.batch_id {
        Some(id) => required_text("batch_id", &id)?,
        None => Uuid::new_v4().to_string(),
    };

    let txn = db.begin().await?;
    let now = chrono::Utc::now();
    let mut stored = Vec::with_capacity(batch.predictions.len());
    for prediction in batch.predictions {
        if get_customer_by_id(&txn, prediction.customer_id).await?.is_none() {
            return Err(Error::not_found("customer", prediction.customer_id));
        }
        if let Some(product_id) = prediction.gas_product_id
            && get_gas_product_by_id(&txn, product_id).await?.is_none()
        {
            return Err(Error::not_found("gas product", product_id));
        }

        let row = delivery_prediction::ActiveModel {
            customer_id: Set(prediction.customer_id),
            gas_product_id: Set(prediction.gas_product_id),
            predicted_date: Set(prediction.predicted_date),
            predicted_quantity: Set(prediction.predicted_quantity),
            confidence_score: Set(prediction.confidence_score),
            model_version: Set(model_version.clone()),
            prediction_batch_id: Set(batch_id.clone()),
            is_converted_to_order: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        stored.push(row);
    }
    txn.commit().await?;

    info!(batch_id = %batch_id, stored = stored.len(), "Stored prediction batch");
    Ok(stored)
}

/// Lists predictions by predicted day.
pub async fn list_predictions<C>(
    db: &C,
    filter: &PredictionFilter,
    page: Pagination,
) -> Result<Vec<delivery_prediction::Model>>
where
    C: ConnectionTrait,
{
    DeliveryPrediction::find()
        .apply_if(filter.batch_id.clone(), |q, id| {
            q.filter(delivery_prediction::Column::PredictionBatchId.eq(id))
        })
        .apply_if(filter.customer_id, |q, id| {
            q.filter(delivery_prediction::Column::CustomerId.eq(id))
        })
        .apply_if(filter.date_from, |q, date| {
            q.filter(delivery_prediction::Column::PredictedDate.gte(date))
        })
        .apply_if(filter.date_to, |q, date| {
            q.filter(delivery_prediction::Column::PredictedDate.lte(date))
        })
        .apply_if(filter.converted, |q, converted| {
            q.filter(delivery_prediction::Column::IsConvertedToOrder.eq(converted))
        })
        .order_by_asc(delivery_prediction::Column::PredictedDate)
        .order_by_asc(delivery_prediction::Column::Id)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a prediction as turned into an order.
///
/// # Errors
/// Returns [`Error::Conflict`] if it was already converted.
pub async fn mark_prediction_converted<C>(
    db: &C,
    prediction_id: i64,
) -> Result<delivery_prediction::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = DeliveryPrediction::find_by_id(prediction_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("prediction", prediction_id))?;
    if existing.is_converted_to_order {
        return Err(Error::conflict(format!(
            "prediction {prediction_id} was already converted"
        )));
    }

    let mut prediction: delivery_prediction::ActiveModel = existing.into();
    prediction.is_converted_to_order = Set(true);
    prediction.update(db).await.map_err(Into::into)
}
