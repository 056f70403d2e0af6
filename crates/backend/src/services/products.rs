//! Product creation, updates, and queries.

use std::sync::Arc;

use crate::db::ProductStorage;
use crate::domain::{CreateProductRequest, ListProductsRequest, Product, UpdateProductRequest};
use crate::error::Result;

/// Application service for the product collection.
pub struct ProductService<S> {
    storage: Arc<S>,
}

impl<S: ProductStorage> ProductService<S> {
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// # Errors
    ///
    /// Returns `Error::ProductValidation` on invalid input, or a storage
    /// error.
    pub async fn create_product(&self, req: CreateProductRequest) -> Result<Product> {
        tracing::info!(operation = "create_product", "creating product");

        let product = Product::new(req).inspect_err(|error| {
            tracing::error!(%error, "product request validation failed");
        })?;

        self.storage.create(&product).await?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Field-level partial update.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProductValidation` on invalid input,
    /// `Error::ProductNotFound` if the id matches no row, or a storage
    /// error.
    pub async fn update_product(&self, req: &UpdateProductRequest) -> Result<Product> {
        tracing::info!(operation = "update_product", product_id = %req.id, "updating product");
        self.storage.update(req).await
    }

    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list_products(&self, req: &ListProductsRequest) -> Result<Vec<Product>> {
        tracing::debug!(
            operation = "list_products",
            ids_count = req.ids.len(),
            "fetching products"
        );
        self.storage.list(req).await
    }

    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn count_products(&self, req: &ListProductsRequest) -> Result<i64> {
        self.storage.count(req).await
    }
}
