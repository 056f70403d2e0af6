//! Order aggregate, items, snapshots, and the status state machine.
//!
//! An order is created once with at least one item; after that the only
//! mutation is a status transition. Each item embeds a [`ProductSnapshot`]
//! copied from the product at order time, so the historical record stays
//! accurate no matter what happens to the product later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CacheKey, KeyEncoder, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use crate::domain::clamp_page;
use crate::error::{Error, Result};

/// Product fields captured at order-creation time.
///
/// A value copy, deliberately decoupled from the live product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub description: String,
    pub tags: Vec<String>,
}

/// A single line of an order. Immutable after creation.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub snapshot: ProductSnapshot,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    fn new(order_id: OrderId, line: OrderLine) -> Result<Self> {
        if line.quantity <= 0 {
            return Err(Error::OrderValidation(
                "item quantity must be positive".into(),
            ));
        }
        if line.snapshot.description.is_empty() {
            return Err(Error::OrderValidation(
                "product snapshot description is required".into(),
            ));
        }
        Ok(Self {
            id: OrderItemId::generate(),
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            snapshot: line.snapshot,
            created_at: Utc::now(),
        })
    }
}

/// Input line for [`Order::new`]: the requested product and quantity plus
/// the snapshot captured by the orchestrator.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub snapshot: ProductSnapshot,
}

/// An order and its items.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validate and build a pending [`Order`], assigning identity and
    /// timestamps to the order and each item.
    ///
    /// # Errors
    ///
    /// Returns `Error::OrderValidation` if there are no lines, a line has a
    /// non-positive quantity, or a snapshot is missing its description.
    pub fn new(user_id: UserId, lines: Vec<OrderLine>) -> Result<Self> {
        if lines.is_empty() {
            return Err(Error::OrderValidation(
                "order must contain at least one item".into(),
            ));
        }
        let id = OrderId::generate();
        let items = lines
            .into_iter()
            .map(|line| OrderItem::new(id, line))
            .collect::<Result<Vec<_>>>()?;
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            status: OrderStatus::Pending,
            items,
            created_at: now,
            updated_at: now,
        })
    }

    /// Sum of item quantities.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    /// Whether cancellation is a legal exit from the current status.
    #[must_use]
    pub const fn can_be_cancelled(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Transition `pending` → `confirmed`.
    ///
    /// # Errors
    ///
    /// Returns `Error::OrderValidation` naming the current status if the
    /// transition is illegal.
    pub fn confirm(&mut self) -> Result<()> {
        if self.status != OrderStatus::Pending {
            return Err(Error::OrderValidation(format!(
                "order cannot be confirmed in status {}",
                self.status
            )));
        }
        self.transition(OrderStatus::Confirmed);
        Ok(())
    }

    /// Transition `confirmed` → `completed`.
    ///
    /// # Errors
    ///
    /// Returns `Error::OrderValidation` naming the current status if the
    /// transition is illegal.
    pub fn complete(&mut self) -> Result<()> {
        if self.status != OrderStatus::Confirmed {
            return Err(Error::OrderValidation(format!(
                "order cannot be completed in status {}",
                self.status
            )));
        }
        self.transition(OrderStatus::Completed);
        Ok(())
    }

    /// Transition `pending`/`confirmed` → `cancelled`.
    ///
    /// # Errors
    ///
    /// Returns `Error::OrderValidation` naming the current status if the
    /// transition is illegal.
    pub fn cancel(&mut self) -> Result<()> {
        if !self.can_be_cancelled() {
            return Err(Error::OrderValidation(format!(
                "order cannot be cancelled in status {}",
                self.status
            )));
        }
        self.transition(OrderStatus::Cancelled);
        Ok(())
    }

    fn transition(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// One requested line of a new order.
#[derive(Debug, Clone)]
pub struct CreateOrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Request to create an order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub items: Vec<CreateOrderItemRequest>,
}

impl CreateOrderRequest {
    /// # Errors
    ///
    /// Returns `Error::OrderValidation` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::OrderValidation(
                "order must contain at least one item".into(),
            ));
        }
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(Error::OrderValidation(
                    "item quantity must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Request to set an order's status.
///
/// Status validity is enforced by the type; the write itself is a
/// storage-level update, not an aggregate transition.
#[derive(Debug, Clone)]
pub struct UpdateOrderRequest {
    pub id: OrderId,
    pub status: OrderStatus,
}

/// Filter for listing/counting orders.
#[derive(Debug, Clone, Default)]
pub struct ListOrdersRequest {
    pub ids: Vec<OrderId>,
    pub user_ids: Vec<UserId>,
    pub statuses: Vec<OrderStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl ListOrdersRequest {
    /// Copy of the request with pagination clamped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let (limit, offset) = clamp_page(self.limit, self.offset);
        Self {
            ids: self.ids.clone(),
            user_ids: self.user_ids.clone(),
            statuses: self.statuses.clone(),
            limit,
            offset,
        }
    }

    /// Content digest of all filter fields. Call on a normalized request.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        let mut enc = KeyEncoder::new();
        enc.uuids(self.ids.iter().map(OrderId::as_uuid));
        enc.uuids(self.user_ids.iter().map(UserId::as_uuid));
        enc.strings(self.statuses.iter().map(|s| s.as_str()));
        enc.u32(u32::try_from(self.limit).unwrap_or(u32::MAX));
        enc.u32(u32::try_from(self.offset).unwrap_or(u32::MAX));
        enc.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot() -> ProductSnapshot {
        ProductSnapshot {
            description: "walnut desk".into(),
            tags: vec!["furniture".into()],
        }
    }

    fn order_with_quantities(quantities: &[i32]) -> Order {
        let lines = quantities
            .iter()
            .map(|&quantity| OrderLine {
                product_id: ProductId::generate(),
                quantity,
                snapshot: snapshot(),
            })
            .collect();
        Order::new(UserId::generate(), lines).unwrap()
    }

    #[test]
    fn new_order_is_pending_and_sums_quantities() {
        let order = order_with_quantities(&[3, 2]);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_quantity(), 5);
        assert!(order.items.iter().all(|item| item.order_id == order.id));
    }

    #[test]
    fn rejects_empty_orders() {
        assert!(matches!(
            Order::new(UserId::generate(), vec![]),
            Err(Error::OrderValidation(_))
        ));
    }

    #[test]
    fn rejects_non_positive_item_quantity() {
        let lines = vec![OrderLine {
            product_id: ProductId::generate(),
            quantity: 0,
            snapshot: snapshot(),
        }];
        assert!(Order::new(UserId::generate(), lines).is_err());
    }

    #[test]
    fn rejects_missing_snapshot_description() {
        let lines = vec![OrderLine {
            product_id: ProductId::generate(),
            quantity: 1,
            snapshot: ProductSnapshot {
                description: String::new(),
                tags: vec![],
            },
        }];
        assert!(Order::new(UserId::generate(), lines).is_err());
    }

    #[test]
    fn happy_path_transitions() {
        let mut order = order_with_quantities(&[1]);
        order.confirm().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        order.complete().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn cancellation_is_legal_from_pending_and_confirmed_only() {
        let mut order = order_with_quantities(&[1]);
        assert!(order.can_be_cancelled());
        order.cancel().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);

        let mut order = order_with_quantities(&[1]);
        order.confirm().unwrap();
        assert!(order.can_be_cancelled());
        order.cancel().unwrap();

        let mut order = order_with_quantities(&[1]);
        order.confirm().unwrap();
        order.complete().unwrap();
        assert!(!order.can_be_cancelled());
        let err = order.cancel().unwrap_err();
        assert!(matches!(err, Error::OrderValidation(msg) if msg.contains("completed")));
    }

    #[test]
    fn terminal_states_reject_forward_transitions() {
        let mut order = order_with_quantities(&[1]);
        order.cancel().unwrap();
        assert!(order.confirm().is_err());
        assert!(order.complete().is_err());
        assert!(order.cancel().is_err());
    }

    #[test]
    fn completing_a_pending_order_is_illegal() {
        let mut order = order_with_quantities(&[1]);
        assert!(order.complete().is_err());
    }

    #[test]
    fn create_request_validation() {
        let req = CreateOrderRequest {
            user_id: UserId::generate(),
            items: vec![],
        };
        assert!(req.validate().is_err());

        let req = CreateOrderRequest {
            user_id: UserId::generate(),
            items: vec![CreateOrderItemRequest {
                product_id: ProductId::generate(),
                quantity: -1,
            }],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn cache_key_distinguishes_statuses_and_offsets() {
        let base = ListOrdersRequest {
            ids: vec![],
            user_ids: vec![UserId::generate()],
            statuses: vec![OrderStatus::Pending],
            limit: 10,
            offset: 0,
        };
        assert_eq!(base.cache_key(), base.cache_key());

        let mut other = base.clone();
        other.statuses = vec![OrderStatus::Confirmed];
        assert_ne!(base.cache_key(), other.cache_key());

        let mut other = base.clone();
        other.offset = 10;
        assert_ne!(base.cache_key(), other.cache_key());
    }
}
