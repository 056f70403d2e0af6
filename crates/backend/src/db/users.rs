//! User store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use stockroom_core::UserId;

use super::cache::ResponseCache;
use super::UserStorage;
use crate::domain::{ListUsersRequest, User};
use crate::error::Result;

const USER_COLUMNS: &str =
    "id, first_name, last_name, age, is_married, password_hash, salt, created_at";

/// `PostgreSQL`-backed user collection with a read cache.
pub struct UserStore {
    pool: PgPool,
    cache: ResponseCache<User>,
}

impl UserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: ResponseCache::new(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    age: i32,
    is_married: bool,
    password_hash: Vec<u8>,
    salt: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            age: row.age,
            is_married: row.is_married,
            password_hash: row.password_hash,
            salt: row.salt,
            created_at: row.created_at,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, req: &ListUsersRequest) {
    if !req.ids.is_empty() {
        qb.push(" AND id = ANY(");
        qb.push_bind(req.ids.iter().map(UserId::as_uuid).collect::<Vec<_>>());
        qb.push(")");
    }
}

#[async_trait]
impl UserStorage for UserStore {
    async fn create(&self, user: &User) -> Result<()> {
        self.cache.invalidate_all();

        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, age, is_married, password_hash, salt, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.age)
        .bind(user.is_married)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, req: &ListUsersRequest) -> Result<Vec<User>> {
        let req = req.normalized();
        let key = req.cache_key();
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        push_filters(&mut qb, &req);
        qb.push(" ORDER BY created_at DESC, id LIMIT ");
        qb.push_bind(req.limit);
        qb.push(" OFFSET ");
        qb.push_bind(req.offset);

        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let users: Vec<User> = rows.into_iter().map(User::from).collect();

        self.cache.insert(key, users.clone()).await;
        Ok(users)
    }

    async fn count(&self, req: &ListUsersRequest) -> Result<i64> {
        let req = req.normalized();

        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_filters(&mut qb, &req);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }
}
