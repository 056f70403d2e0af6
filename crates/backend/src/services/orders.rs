//! Order orchestrator: the use case spanning users, products, and orders.
//!
//! Creation is all-or-nothing: existence and stock sufficiency are checked
//! for every requested line before any reservation, and the persisted
//! write (stock decrements + order + items) is one atomic transaction at
//! the storage boundary. Cancellation restores exactly what was reserved.

use std::collections::HashMap;
use std::sync::Arc;

use stockroom_core::{OrderId, ProductId};

use crate::db::{OrderStorage, ProductStorage, StockReservation, UserStorage};
use crate::domain::{
    CreateOrderRequest, ListOrdersRequest, ListProductsRequest, ListUsersRequest, Order, OrderLine,
    Product, UpdateOrderRequest,
};
use crate::error::{Error, Result};

/// Application service for the order collection.
pub struct OrderService<O, P, U> {
    orders: Arc<O>,
    products: Arc<P>,
    users: Arc<U>,
}

impl<O, P, U> OrderService<O, P, U>
where
    O: OrderStorage,
    P: ProductStorage,
    U: UserStorage,
{
    pub const fn new(orders: Arc<O>, products: Arc<P>, users: Arc<U>) -> Self {
        Self {
            orders,
            products,
            users,
        }
    }

    /// Create an order for a user, reserving stock for every line.
    ///
    /// # Errors
    ///
    /// - `Error::OrderValidation` for a malformed request
    /// - `Error::UserNotFound` / `Error::ProductNotFound` for missing
    ///   references
    /// - `Error::InsufficientStock` when any line (after aggregating
    ///   duplicate product ids) exceeds available stock; no stock is
    ///   reserved in that case
    pub async fn create_order(&self, req: &CreateOrderRequest) -> Result<Order> {
        tracing::info!(
            operation = "create_order",
            user_id = %req.user_id,
            items_count = req.items.len(),
            "creating new order"
        );

        req.validate().inspect_err(|error| {
            tracing::error!(%error, "order request validation failed");
        })?;

        let users = self
            .users
            .list(&ListUsersRequest {
                ids: vec![req.user_id],
                limit: 1,
                offset: 0,
            })
            .await?;
        if users.is_empty() {
            tracing::error!(user_id = %req.user_id, "user not found");
            return Err(Error::UserNotFound);
        }

        // Aggregate requested quantity per distinct product, preserving
        // first-seen order.
        let mut totals: Vec<(ProductId, i32)> = Vec::new();
        for item in &req.items {
            match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, quantity)) => *quantity += item.quantity,
                None => totals.push((item.product_id, item.quantity)),
            }
        }

        tracing::debug!(unique_products = totals.len(), "fetching products for order");

        let products = self
            .products
            .list(&ListProductsRequest {
                ids: totals.iter().map(|(id, _)| *id).collect(),
                limit: i64::try_from(totals.len()).unwrap_or(i64::MAX),
                ..Default::default()
            })
            .await?;
        let mut by_id: HashMap<ProductId, Product> =
            products.into_iter().map(|p| (p.id, p)).collect();

        // All-or-nothing: verify existence and sufficiency for every line
        // before reserving anything.
        for (product_id, requested) in &totals {
            let Some(product) = by_id.get(product_id) else {
                tracing::error!(product_id = %product_id, "product not found");
                return Err(Error::ProductNotFound(*product_id));
            };
            if product.quantity < *requested {
                tracing::error!(
                    product_id = %product_id,
                    available = product.quantity,
                    requested,
                    "insufficient stock"
                );
                return Err(Error::InsufficientStock {
                    product_id: *product_id,
                    available: product.quantity,
                    requested: *requested,
                });
            }
        }

        tracing::debug!("reserving product quantities");

        let mut reservations = Vec::with_capacity(totals.len());
        for (product_id, requested) in &totals {
            if let Some(product) = by_id.get_mut(product_id) {
                product.reserve(*requested)?;
                reservations.push(StockReservation {
                    product_id: *product_id,
                    quantity: *requested,
                });
            }
        }

        // One line per requested item, each with a snapshot of the product
        // as it is right now.
        let mut lines = Vec::with_capacity(req.items.len());
        for item in &req.items {
            let snapshot = by_id
                .get(&item.product_id)
                .map(Product::snapshot)
                .ok_or(Error::ProductNotFound(item.product_id))?;
            lines.push(OrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
                snapshot,
            });
        }
        let order = Order::new(req.user_id, lines)?;

        // The order transaction writes product rows too; its cache must not
        // serve pre-write state afterwards.
        self.products.invalidate_cache().await;
        self.orders.create(&order, &reservations).await?;

        tracing::info!(order_id = %order.id, "order created");
        Ok(order)
    }

    /// Cancel an order, restoring exactly the stock it reserved.
    ///
    /// Products that no longer exist are skipped; their stock cannot be
    /// restored.
    ///
    /// # Errors
    ///
    /// - `Error::OrderNotFound` if the id matches no order
    /// - `Error::OrderValidation` if the order is not in a cancellable
    ///   status; no stock is mutated in that case
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        tracing::info!(operation = "cancel_order", %order_id, "cancelling order");

        let orders = self
            .orders
            .list(&ListOrdersRequest {
                ids: vec![order_id],
                limit: 1,
                ..Default::default()
            })
            .await?;
        let Some(mut order) = orders.into_iter().next() else {
            return Err(Error::OrderNotFound);
        };

        // Validates the transition before any stock mutation.
        order.cancel().inspect_err(|error| {
            tracing::error!(%error, "order cannot be cancelled");
        })?;

        let mut totals: Vec<(ProductId, i32)> = Vec::new();
        for item in &order.items {
            match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, quantity)) => *quantity += item.quantity,
                None => totals.push((item.product_id, item.quantity)),
            }
        }

        for (product_id, quantity) in totals {
            let restored = self.products.restore_quantity(product_id, quantity).await?;
            if restored.is_none() {
                tracing::warn!(
                    product_id = %product_id,
                    quantity,
                    "product no longer exists; stock not restored"
                );
            }
        }

        let updated = self
            .orders
            .update(&UpdateOrderRequest {
                id: order.id,
                status: order.status,
            })
            .await?;

        tracing::info!(order_id = %updated.id, "order cancelled");
        Ok(updated)
    }

    /// Storage-level status write; no aggregate transition validation.
    ///
    /// # Errors
    ///
    /// Returns `Error::OrderNotFound` if the id matches no order, or a
    /// storage error.
    pub async fn update_order(&self, req: &UpdateOrderRequest) -> Result<Order> {
        tracing::info!(operation = "update_order", order_id = %req.id, status = %req.status, "updating order");
        self.orders.update(req).await
    }

    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list_orders(&self, req: &ListOrdersRequest) -> Result<Vec<Order>> {
        tracing::debug!(
            operation = "list_orders",
            ids_count = req.ids.len(),
            "fetching orders"
        );
        self.orders.list(req).await
    }

    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn count_orders(&self, req: &ListOrdersRequest) -> Result<i64> {
        self.orders.count(req).await
    }
}
