//! Domain entities, requests, and invariants.
//!
//! Entities are created through validated constructors that auto-assign
//! identity and creation time; requests validate themselves before any
//! mutation is attempted. List requests normalize their pagination once
//! (at the storage boundary) and derive a content-addressed cache key
//! from their normalized fields.

pub mod order;
pub mod product;
pub mod user;

pub use order::{
    CreateOrderItemRequest, CreateOrderRequest, ListOrdersRequest, Order, OrderItem, OrderLine,
    ProductSnapshot, UpdateOrderRequest,
};
pub use product::{CreateProductRequest, ListProductsRequest, Product, UpdateProductRequest};
pub use user::{CreateUserRequest, ListUsersRequest, User};

/// Default page size applied when a request carries no (or a non-positive)
/// limit.
pub const DEFAULT_LIMIT: i64 = 10;

/// Upper bound on page size.
pub const MAX_LIMIT: i64 = 100;

/// Clamp pagination to `limit ∈ [1, 100]` (defaulting to 10) and
/// `offset ≥ 0`. Idempotent, so normalizing twice is harmless.
pub(crate) const fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    let limit = if limit <= 0 {
        DEFAULT_LIMIT
    } else if limit > MAX_LIMIT {
        MAX_LIMIT
    } else {
        limit
    };
    let offset = if offset < 0 { 0 } else { offset };
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping_is_idempotent() {
        for (limit, offset) in [(0, -5), (7, 3), (500, 0), (-1, i64::MAX)] {
            let once = clamp_page(limit, offset);
            let twice = clamp_page(once.0, once.1);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_page(0, 0), (DEFAULT_LIMIT, 0));
        assert_eq!(clamp_page(101, -1), (MAX_LIMIT, 0));
        assert_eq!(clamp_page(1, 10), (1, 10));
    }
}
