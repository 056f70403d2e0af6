//! Product endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::ProductId;

use super::{ListResponse, parse_csv};
use crate::domain::{CreateProductRequest, ListProductsRequest, Product, UpdateProductRequest};
use crate::error::{Error, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProductBody {
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductBody {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub description: String,
    pub tags: Vec<String>,
    pub quantity: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let available = product.is_available();
        Self {
            id: product.id,
            description: product.description,
            tags: product.tags,
            quantity: product.quantity,
            available,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListProductsQuery {
    pub ids: Option<String>,
    pub tags: Option<String>,
    pub available: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListProductsQuery {
    fn into_request(self) -> Result<ListProductsRequest> {
        let ids = parse_csv(self.ids.as_deref())
            .map_err(|bad| Error::ProductValidation(format!("invalid product id: {bad}")))?;
        let tags = parse_csv(self.tags.as_deref())
            .map_err(|bad| Error::ProductValidation(format!("invalid tag: {bad}")))?;
        Ok(ListProductsRequest {
            ids,
            tags,
            available: self.available,
            limit: self.limit.unwrap_or_default(),
            offset: self.offset.unwrap_or_default(),
        })
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateProductBody>,
) -> Result<impl IntoResponse> {
    let product = state
        .products()
        .create_product(CreateProductRequest {
            description: body.description,
            tags: body.tags,
            quantity: body.quantity,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductBody>,
) -> Result<Json<ProductResponse>> {
    let product = state
        .products()
        .update_product(&UpdateProductRequest {
            id,
            description: body.description,
            tags: body.tags,
            quantity: body.quantity,
        })
        .await?;
    Ok(Json(ProductResponse::from(product)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ListResponse<ProductResponse>>> {
    let req = query.into_request()?;
    let products = state.products().list_products(&req).await?;
    let total = state.products().count_products(&req).await?;
    Ok(Json(ListResponse {
        items: products.into_iter().map(ProductResponse::from).collect(),
        total,
    }))
}
