//! Unified error handling.
//!
//! Every layer of the backend returns [`Error`]; the kinds distinguish bad
//! input (validation), missing resources, and stock arithmetic failures so
//! the transport layer can map them to different outward signals. Storage
//! failures are carried opaquely and never exposed to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use stockroom_core::ProductId;

/// Convenience alias used throughout the backend.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A user request failed validation.
    #[error("user validation: {0}")]
    UserValidation(String),

    /// The referenced user does not exist.
    #[error("user not found")]
    UserNotFound,

    /// A product request failed validation.
    #[error("product validation: {0}")]
    ProductValidation(String),

    /// The referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// An order request failed validation, or a status transition is illegal.
    #[error("order validation: {0}")]
    OrderValidation(String),

    /// The referenced order does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// A reservation asked for more stock than the product has.
    #[error(
        "insufficient stock for product {product_id}: requested {requested} but only {available} available"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: i32,
    },

    /// A stock operation was given a non-positive quantity.
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// JSON error body returned to clients.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UserValidation(_)
            | Self::ProductValidation(_)
            | Self::OrderValidation(_)
            | Self::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
            Self::UserNotFound | Self::ProductNotFound(_) | Self::OrderNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::InsufficientStock { .. } => StatusCode::CONFLICT,
            Self::Database(_) | Self::DataCorruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        // Don't expose storage details to clients
        let message = match &self {
            Self::Database(_) | Self::DataCorruption(_) => "internal server error".to_owned(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let response = Error::OrderValidation("no items".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = Error::UserNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = Error::ProductNotFound(ProductId::generate()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn insufficient_stock_maps_to_conflict() {
        let response = Error::InsufficientStock {
            product_id: ProductId::generate(),
            available: 1,
            requested: 5,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_errors_are_hidden() {
        let response = Error::DataCorruption("bad status".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
