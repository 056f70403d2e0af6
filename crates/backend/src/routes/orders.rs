//! Order endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::{ListResponse, parse_csv};
use crate::domain::{
    CreateOrderItemRequest, CreateOrderRequest, ListOrdersRequest, Order, OrderItem,
    ProductSnapshot, UpdateOrderRequest,
};
use crate::error::{Error, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderItemBody {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub user_id: UserId,
    pub items: Vec<CreateOrderItemBody>,
}

/// Status arrives as a plain string so an unknown value maps to a
/// validation error instead of a serde deserialization failure.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderBody {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub snapshot: ProductSnapshot,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            snapshot: item.snapshot,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub total_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total_quantity = order.total_quantity();
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
            total_quantity,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListOrdersQuery {
    pub ids: Option<String>,
    pub user_ids: Option<String>,
    pub statuses: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListOrdersQuery {
    fn into_request(self) -> Result<ListOrdersRequest> {
        let ids = parse_csv(self.ids.as_deref())
            .map_err(|bad| Error::OrderValidation(format!("invalid order id: {bad}")))?;
        let user_ids = parse_csv(self.user_ids.as_deref())
            .map_err(|bad| Error::OrderValidation(format!("invalid user id: {bad}")))?;
        let statuses = parse_csv(self.statuses.as_deref())
            .map_err(|bad| Error::OrderValidation(format!("invalid status: {bad}")))?;
        Ok(ListOrdersRequest {
            ids,
            user_ids,
            statuses,
            limit: self.limit.unwrap_or_default(),
            offset: self.offset.unwrap_or_default(),
        })
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<impl IntoResponse> {
    let order = state
        .orders()
        .create_order(&CreateOrderRequest {
            user_id: body.user_id,
            items: body
                .items
                .into_iter()
                .map(|item| CreateOrderItemRequest {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    raw.parse()
        .map_err(|_| Error::OrderValidation(format!("invalid status: {raw}")))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateOrderBody>,
) -> Result<Json<OrderResponse>> {
    let status = parse_status(&body.status)?;
    let order = state
        .orders()
        .update_order(&UpdateOrderRequest { id, status })
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = state.orders().cancel_order(id).await?;
    Ok(Json(OrderResponse::from(order)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ListResponse<OrderResponse>>> {
    let req = query.into_request()?;
    let orders = state.orders().list_orders(&req).await?;
    let total = state.orders().count_orders(&req).await?;
    Ok(Json(ListResponse {
        items: orders.into_iter().map(OrderResponse::from).collect(),
        total,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_parse() {
        assert_eq!(parse_status("pending").unwrap(), OrderStatus::Pending);
        assert_eq!(parse_status("cancelled").unwrap(), OrderStatus::Cancelled);
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = parse_status("shipped").unwrap_err();
        assert!(matches!(err, Error::OrderValidation(msg) if msg.contains("shipped")));
    }
}
