//! Core business logic - framework-agnostic services over the entity layer.
//!
//! Every function takes a database connection or an open transaction and returns the
//! crate [`Result`](crate::errors::Result).
//! Multi-row mutations run inside a single database transaction.

pub mod api_key;
pub mod audit;
pub mod customer;
pub mod delivery;
pub mod driver;
pub mod gas_product;
pub mod inventory;
pub mod order;
pub mod pagination;
pub mod prediction;
pub mod route;
pub mod user;
pub mod vehicle;
pub mod webhook;

pub use pagination::Pagination;

use crate::errors::{Error, Result};

/// Trims a required text field, rejecting blank input.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank input becomes `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rejects negative or non-finite amounts.
pub(crate) fn non_negative_amount(field: &'static str, amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { field, amount });
    }
    Ok(amount)
}

/// Rounds a currency value to cents.
#[must_use]
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
