//! HTTP error mapping.
//!
//! Every handler returns [`ApiResult`]; the crate [`Error`] is rendered as a JSON
//! [`ErrorResponse`] with a matching status code. Database and I/O failures are logged
//! and reported without internal detail.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub error: String,
    /// Human-readable description
    pub message: String,
    /// Extra context, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Builds a body without details.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attaches details to the body.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Result type of all handlers
pub type ApiResult<T> = std::result::Result<T, Error>;

impl Error {
    /// Status code this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::InvalidQuantity { .. }
            | Self::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::IntConversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::Unauthorized => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::IntConversion(_) => {
                "internal_error"
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            error!(error = %self, "Request failed");
            ErrorResponse::new(self.kind(), "Internal server error")
        } else {
            match &self {
                Self::Unauthorized => {
                    ErrorResponse::new(self.kind(), "Invalid or missing API key")
                }
                Self::NotFound { entity, id } => {
                    ErrorResponse::new(self.kind(), format!("{entity} not found"))
                        .with_details(format!("id: {id}"))
                }
                _ => ErrorResponse::new(self.kind(), self.to_string()),
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidQuantity {
                field: "quantity",
                quantity: -1
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::not_found("order", 1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::conflict("dup").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            Error::Database(DbErr::Custom("down".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_render_500() {
        let response = Error::Database(DbErr::Custom("secret".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
