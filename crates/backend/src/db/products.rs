//! Product store.
//!
//! All stock mutations here are expressed as single atomic statements
//! (conditional decrement, unconditional increment) so concurrent writers
//! serialize on the row instead of racing a read-then-write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use stockroom_core::ProductId;

use super::ProductStorage;
use super::cache::ResponseCache;
use crate::domain::product::sanitize_tags;
use crate::domain::{ListProductsRequest, Product, UpdateProductRequest};
use crate::error::{Error, Result};

const PRODUCT_COLUMNS: &str = "id, description, tags, quantity, created_at, updated_at";

/// `PostgreSQL`-backed product collection with a read cache.
pub struct ProductStore {
    pool: PgPool,
    cache: ResponseCache<Product>,
}

impl ProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: ResponseCache::new(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    description: String,
    tags: Vec<String>,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            description: row.description,
            tags: row.tags,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, req: &ListProductsRequest) {
    if !req.ids.is_empty() {
        qb.push(" AND id = ANY(");
        qb.push_bind(req.ids.iter().map(ProductId::as_uuid).collect::<Vec<_>>());
        qb.push(")");
    }
    if !req.tags.is_empty() {
        qb.push(" AND tags && ");
        qb.push_bind(req.tags.clone());
    }
    match req.available {
        Some(true) => {
            qb.push(" AND quantity > 0");
        }
        Some(false) => {
            qb.push(" AND quantity = 0");
        }
        None => {}
    }
}

#[async_trait]
impl ProductStorage for ProductStore {
    async fn create(&self, product: &Product) -> Result<()> {
        self.cache.invalidate_all();

        sqlx::query(
            "INSERT INTO products (id, description, tags, quantity, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.description)
        .bind(&product.tags)
        .bind(product.quantity)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, req: &UpdateProductRequest) -> Result<Product> {
        self.cache.invalidate_all();
        req.validate()?;

        let mut qb = QueryBuilder::new("UPDATE products SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(description) = &req.description {
            qb.push(", description = ");
            qb.push_bind(description.trim().to_owned());
        }
        if let Some(tags) = &req.tags {
            qb.push(", tags = ");
            qb.push_bind(sanitize_tags(tags.clone()));
        }
        if let Some(quantity) = req.quantity {
            qb.push(", quantity = ");
            qb.push_bind(quantity);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(req.id.as_uuid());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(Error::ProductNotFound(req.id));
        }

        let products = self
            .list(&ListProductsRequest {
                ids: vec![req.id],
                limit: 1,
                ..Default::default()
            })
            .await?;
        products
            .into_iter()
            .next()
            .ok_or(Error::ProductNotFound(req.id))
    }

    async fn restore_quantity(&self, id: ProductId, quantity: i32) -> Result<Option<Product>> {
        if quantity <= 0 {
            return Err(Error::InvalidQuantity {
                product_id: id,
                quantity,
            });
        }

        self.cache.invalidate_all();

        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET quantity = quantity + $1, updated_at = $2 WHERE id = $3 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(quantity)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn list(&self, req: &ListProductsRequest) -> Result<Vec<Product>> {
        let req = req.normalized();
        let key = req.cache_key();
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        let mut qb = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"
        ));
        push_filters(&mut qb, &req);
        qb.push(" ORDER BY created_at DESC, id LIMIT ");
        qb.push_bind(req.limit);
        qb.push(" OFFSET ");
        qb.push_bind(req.offset);

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let products: Vec<Product> = rows.into_iter().map(Product::from).collect();

        self.cache.insert(key, products.clone()).await;
        Ok(products)
    }

    async fn count(&self, req: &ListProductsRequest) -> Result<i64> {
        let req = req.normalized();

        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM products WHERE TRUE");
        push_filters(&mut qb, &req);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}
