//! Storage layer: `PostgreSQL` stores and their read caches.
//!
//! # Tables
//!
//! - `users` - Registered users (immutable after creation)
//! - `products` - Products with available stock
//! - `orders` / `order_items` - Orders with embedded product snapshots
//!
//! # Migrations
//!
//! Migrations live in `crates/backend/migrations/` and are run externally
//! via `sqlx migrate run` (no in-process runner).
//!
//! # Caching
//!
//! Each store owns a [`cache::ResponseCache`] fronting its list path and
//! invalidates it wholesale before any write to its collection.

pub mod cache;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use stockroom_core::ProductId;

use crate::domain::{
    ListOrdersRequest, ListProductsRequest, ListUsersRequest, Order, Product, UpdateOrderRequest,
    UpdateProductRequest, User,
};
use crate::error::Result;

pub use orders::OrderStore;
pub use products::ProductStore;
pub use users::UserStore;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await?;
    Ok(pool)
}

/// A stock decrement to apply atomically with an order insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockReservation {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Persistence gateway for the user collection.
#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;
    async fn list(&self, req: &ListUsersRequest) -> Result<Vec<User>>;
    async fn count(&self, req: &ListUsersRequest) -> Result<i64>;
}

/// Persistence gateway for the product collection.
#[async_trait]
pub trait ProductStorage: Send + Sync {
    async fn create(&self, product: &Product) -> Result<()>;

    /// Apply a field-level partial update and return the updated product.
    /// Absence is detected by row count and fails with `ProductNotFound`.
    async fn update(&self, req: &UpdateProductRequest) -> Result<Product>;

    /// Atomically add `quantity` back to a product's stock. Returns `None`
    /// when the product no longer exists (callers skip restoration then).
    async fn restore_quantity(&self, id: ProductId, quantity: i32) -> Result<Option<Product>>;

    async fn list(&self, req: &ListProductsRequest) -> Result<Vec<Product>>;
    async fn count(&self, req: &ListProductsRequest) -> Result<i64>;

    /// Drop all cached list results. Called by the orchestrator before a
    /// write that touches product rows outside this store (the order
    /// transaction decrements stock).
    async fn invalidate_cache(&self);
}

/// Persistence gateway for the order collection.
#[async_trait]
pub trait OrderStorage: Send + Sync {
    /// Persist the order, its items, and the given stock decrements as one
    /// atomic transaction: either every row is committed or none are. Each
    /// decrement is conditional on sufficient stock, so concurrent
    /// reservations against the same product serialize on the row instead
    /// of racing a read-then-write.
    async fn create(&self, order: &Order, reservations: &[StockReservation]) -> Result<()>;

    /// Storage-level status write. Absence is detected by row count and
    /// fails with `OrderNotFound`. Returns the reloaded order.
    async fn update(&self, req: &UpdateOrderRequest) -> Result<Order>;

    async fn list(&self, req: &ListOrdersRequest) -> Result<Vec<Order>>;
    async fn count(&self, req: &ListOrdersRequest) -> Result<i64>;
}
