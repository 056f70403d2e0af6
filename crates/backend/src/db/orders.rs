//! Order store.
//!
//! Order creation commits the order row, every item row, and the stock
//! decrements it reserves in ONE transaction: a failure at any point rolls
//! all of it back, so stock and orders can never disagree.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use stockroom_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::cache::ResponseCache;
use super::{OrderStorage, StockReservation};
use crate::domain::{ListOrdersRequest, Order, OrderItem, ProductSnapshot, UpdateOrderRequest};
use crate::error::{Error, Result};

/// `PostgreSQL`-backed order collection with a read cache.
pub struct OrderStore {
    pool: PgPool,
    cache: ResponseCache<Order>,
}

impl OrderStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: ResponseCache::new(),
        }
    }

    /// Batch-load the items of the given orders and attach them, preserving
    /// per-order item creation order.
    async fn load_items(&self, orders: &mut [Order]) -> Result<()> {
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();

        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, product_id, quantity, product_snapshot, created_at \
             FROM order_items WHERE order_id = ANY($1) ORDER BY created_at",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = OrderItem::from(row);
            by_order.entry(item.order_id).or_default().push(item);
        }
        for order in orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|_| Error::DataCorruption(format!("unknown order status: {}", self.status)))?;
        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            status,
            items: Vec::new(), // loaded separately
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    product_snapshot: Json<ProductSnapshot>,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            snapshot: row.product_snapshot.0,
            created_at: row.created_at,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, req: &ListOrdersRequest) {
    if !req.ids.is_empty() {
        qb.push(" AND id = ANY(");
        qb.push_bind(req.ids.iter().map(OrderId::as_uuid).collect::<Vec<_>>());
        qb.push(")");
    }
    if !req.user_ids.is_empty() {
        qb.push(" AND user_id = ANY(");
        qb.push_bind(req.user_ids.iter().map(UserId::as_uuid).collect::<Vec<_>>());
        qb.push(")");
    }
    if !req.statuses.is_empty() {
        qb.push(" AND status = ANY(");
        qb.push_bind(
            req.statuses
                .iter()
                .map(|s| s.as_str().to_owned())
                .collect::<Vec<_>>(),
        );
        qb.push(")");
    }
}

#[async_trait]
impl OrderStorage for OrderStore {
    async fn create(&self, order: &Order, reservations: &[StockReservation]) -> Result<()> {
        self.cache.invalidate_all();

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for reservation in reservations {
            let result = sqlx::query(
                "UPDATE products SET quantity = quantity - $1, updated_at = $2 \
                 WHERE id = $3 AND quantity >= $1",
            )
            .bind(reservation.quantity)
            .bind(now)
            .bind(reservation.product_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Either the product vanished or another writer took the
                // stock first. Look once more to report which.
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT quantity FROM products WHERE id = $1")
                        .bind(reservation.product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;
                return Err(available.map_or(
                    Error::ProductNotFound(reservation.product_id),
                    |available| Error::InsufficientStock {
                        product_id: reservation.product_id,
                        available,
                        requested: reservation.quantity,
                    },
                ));
            }
        }

        sqlx::query(
            "INSERT INTO orders (id, user_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items \
                 (id, order_id, product_id, quantity, product_snapshot, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(Json(&item.snapshot))
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, req: &UpdateOrderRequest) -> Result<Order> {
        self.cache.invalidate_all();

        let result = sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(req.status.as_str())
            .bind(Utc::now())
            .bind(req.id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::OrderNotFound);
        }

        let orders = self
            .list(&ListOrdersRequest {
                ids: vec![req.id],
                limit: 1,
                ..Default::default()
            })
            .await?;
        orders.into_iter().next().ok_or(Error::OrderNotFound)
    }

    async fn list(&self, req: &ListOrdersRequest) -> Result<Vec<Order>> {
        let req = req.normalized();
        let key = req.cache_key();
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        let mut qb = QueryBuilder::new(
            "SELECT id, user_id, status, created_at, updated_at FROM orders WHERE TRUE",
        );
        push_filters(&mut qb, &req);
        qb.push(" ORDER BY created_at DESC, id LIMIT ");
        qb.push_bind(req.limit);
        qb.push(" OFFSET ");
        qb.push_bind(req.offset);

        let rows: Vec<OrderRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut orders = rows
            .into_iter()
            .map(OrderRow::into_order)
            .collect::<Result<Vec<_>>>()?;

        if !orders.is_empty() {
            self.load_items(&mut orders).await?;
        }

        self.cache.insert(key, orders.clone()).await;
        Ok(orders)
    }

    async fn count(&self, req: &ListOrdersRequest) -> Result<i64> {
        let req = req.normalized();

        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE TRUE");
        push_filters(&mut qb, &req);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }
}
