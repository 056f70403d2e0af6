//! Product entity and the stock ledger.
//!
//! The one invariant that matters: quantity never goes negative. Failed
//! reservations must leave the aggregate untouched.

use chrono::{DateTime, Utc};

use stockroom_core::{CacheKey, KeyEncoder, ProductId};

use crate::domain::clamp_page;
use crate::domain::order::ProductSnapshot;
use crate::error::{Error, Result};

/// A product with its available stock.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub description: String,
    pub tags: Vec<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Validate and build a [`Product`], assigning identity and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProductValidation` naming the offending field.
    pub fn new(req: CreateProductRequest) -> Result<Self> {
        req.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: ProductId::generate(),
            description: req.description.trim().to_owned(),
            tags: sanitize_tags(req.tags),
            quantity: req.quantity,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether any stock is available.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.quantity > 0
    }

    /// Decrement available stock for a reservation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidQuantity` for a non-positive amount and
    /// `Error::InsufficientStock` when `quantity` exceeds the available
    /// stock. The aggregate is unchanged on failure.
    pub fn reserve(&mut self, quantity: i32) -> Result<()> {
        if quantity <= 0 {
            return Err(Error::InvalidQuantity {
                product_id: self.id,
                quantity,
            });
        }
        if self.quantity < quantity {
            return Err(Error::InsufficientStock {
                product_id: self.id,
                available: self.quantity,
                requested: quantity,
            });
        }
        self.quantity -= quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Increment stock, e.g. when an order is cancelled. No upper bound.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidQuantity` for a non-positive amount.
    pub fn restore(&mut self, quantity: i32) -> Result<()> {
        if quantity <= 0 {
            return Err(Error::InvalidQuantity {
                product_id: self.id,
                quantity,
            });
        }
        self.quantity += quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Copy of the historical fields captured with order items.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            description: self.description.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Trim tags and drop the ones that end up empty.
pub(crate) fn sanitize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_owned())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Request to create a product.
#[derive(Debug, Clone)]
pub struct CreateProductRequest {
    pub description: String,
    pub tags: Vec<String>,
    pub quantity: i32,
}

impl CreateProductRequest {
    /// # Errors
    ///
    /// Returns `Error::ProductValidation` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::ProductValidation("description is required".into()));
        }
        if self.quantity < 0 {
            return Err(Error::ProductValidation(
                "quantity cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Field-level partial update of a product.
#[derive(Debug, Clone)]
pub struct UpdateProductRequest {
    pub id: ProductId,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub quantity: Option<i32>,
}

impl UpdateProductRequest {
    /// # Errors
    ///
    /// Returns `Error::ProductValidation` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if let Some(description) = &self.description
            && description.trim().is_empty()
        {
            return Err(Error::ProductValidation(
                "description cannot be empty".into(),
            ));
        }
        if let Some(quantity) = self.quantity
            && quantity < 0
        {
            return Err(Error::ProductValidation(
                "quantity cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Filter for listing/counting products.
#[derive(Debug, Clone, Default)]
pub struct ListProductsRequest {
    pub ids: Vec<ProductId>,
    /// Match products carrying any of these tags.
    pub tags: Vec<String>,
    /// `Some(true)`: in stock only; `Some(false)`: out of stock only.
    pub available: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl ListProductsRequest {
    /// Copy of the request with pagination clamped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let (limit, offset) = clamp_page(self.limit, self.offset);
        Self {
            ids: self.ids.clone(),
            tags: self.tags.clone(),
            available: self.available,
            limit,
            offset,
        }
    }

    /// Content digest of all filter fields. Call on a normalized request.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        let mut enc = KeyEncoder::new();
        enc.uuids(self.ids.iter().map(ProductId::as_uuid));
        enc.strings(self.tags.iter().map(String::as_str));
        enc.optional_bool(self.available);
        enc.u32(u32::try_from(self.limit).unwrap_or(u32::MAX));
        enc.u32(u32::try_from(self.offset).unwrap_or(u32::MAX));
        enc.finish()
    }
}
