//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BackendConfig;
use crate::db::{OrderStore, ProductStore, UserStore};
use crate::services::{OrderService, ProductService, UserService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The three stores are shared between the
/// per-collection services and the order orchestrator so each collection
/// has exactly one cache instance.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BackendConfig,
    users: UserService<UserStore>,
    products: ProductService<ProductStore>,
    orders: OrderService<OrderStore, ProductStore, UserStore>,
}

impl AppState {
    /// Wire stores and services on top of a connection pool.
    #[must_use]
    pub fn new(config: BackendConfig, pool: PgPool) -> Self {
        let user_store = Arc::new(UserStore::new(pool.clone()));
        let product_store = Arc::new(ProductStore::new(pool.clone()));
        let order_store = Arc::new(OrderStore::new(pool));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                users: UserService::new(Arc::clone(&user_store)),
                products: ProductService::new(Arc::clone(&product_store)),
                orders: OrderService::new(order_store, product_store, user_store),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn users(&self) -> &UserService<UserStore> {
        &self.inner.users
    }

    #[must_use]
    pub fn products(&self) -> &ProductService<ProductStore> {
        &self.inner.products
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService<OrderStore, ProductStore, UserStore> {
        &self.inner.orders
    }
}
