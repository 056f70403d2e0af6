//! HTTP transport: thin JSON wrappers over the application services.
//!
//! Handlers translate request DTOs into domain requests, call the service,
//! and map the result back. All error mapping lives in [`crate::error`].

pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, patch, post};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/users", post(users::register).get(users::list))
        .route("/products", post(products::create).get(products::list))
        .route("/products/{id}", patch(products::update))
        .route("/orders", post(orders::create).get(orders::list))
        .route("/orders/{id}", patch(orders::update))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Paginated list response body.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Parse a comma-separated query parameter into typed values.
///
/// Empty segments are skipped, so trailing commas are harmless. Returns the
/// offending segment on failure so callers can name it in their validation
/// error.
fn parse_csv<T: FromStr>(raw: Option<&str>) -> Result<Vec<T>, String> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| T::from_str(segment).map_err(|_| segment.to_owned()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stockroom_core::{OrderStatus, ProductId};

    use super::*;

    #[test]
    fn parses_comma_separated_statuses() {
        let statuses: Vec<OrderStatus> = parse_csv(Some("pending,confirmed,")).unwrap();
        assert_eq!(statuses, vec![OrderStatus::Pending, OrderStatus::Confirmed]);
    }

    #[test]
    fn absent_parameter_is_empty() {
        let ids: Vec<ProductId> = parse_csv(None).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn reports_the_offending_segment() {
        let err = parse_csv::<ProductId>(Some("not-a-uuid")).unwrap_err();
        assert_eq!(err, "not-a-uuid");
    }
}
