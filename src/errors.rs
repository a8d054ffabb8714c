//! Unified error type for the delivery backend.
//!
//! Core operations return [`Result`]; the HTTP layer maps each variant onto a status
//! code in `api::error`.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// All errors produced by configuration, persistence and business rules.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(DbErr),

    /// A referenced record does not exist (or is inactive)
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"customer"`
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Input failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description
        message: String,
    },

    /// A cylinder count was zero, negative or otherwise out of range
    #[error("Invalid quantity for {field}: {quantity}")]
    InvalidQuantity {
        /// Field that carried the quantity
        field: &'static str,
        /// Offending value
        quantity: i64,
    },

    /// A monetary amount was negative or not finite
    #[error("Invalid amount for {field}: {amount}")]
    InvalidAmount {
        /// Field that carried the amount
        field: &'static str,
        /// Offending value
        amount: f64,
    },

    /// A uniqueness constraint or business-level conflict
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable description
        message: String,
    },

    /// A status change that the entity's lifecycle does not allow
    #[error("Cannot move {entity} from {from} to {to}")]
    InvalidStatusTransition {
        /// Entity kind, e.g. `"order"`
        entity: &'static str,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Missing, unknown, revoked or expired API key
    #[error("Unauthorized")]
    Unauthorized,

    /// I/O failure (config files, socket binding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Numeric conversion failure
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict {
                message: format!("Duplicate value violates unique constraint: {detail}"),
            },
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => Self::Validation {
                message: format!("Referenced record does not exist: {detail}"),
            },
            _ => Self::Database(err),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("customer", 42);
        assert_eq!(err.to_string(), "customer not found: 42");
    }

    #[test]
    fn test_plain_db_error_stays_database() {
        let err: Error = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = Error::InvalidStatusTransition {
            entity: "order",
            from: "delivered".to_string(),
            to: "pending".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot move order from delivered to pending");
    }
}
