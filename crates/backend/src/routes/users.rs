//! User endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

use super::{ListResponse, parse_csv};
use crate::domain::{CreateUserRequest, ListUsersRequest, User};
use crate::error::{Error, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterUserBody {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    #[serde(default)]
    pub is_married: bool,
    pub password: String,
}

/// User representation returned to clients. Never carries hash or salt.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub age: i32,
    pub is_married: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            age: user.age,
            is_married: user.is_married,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListUsersQuery {
    pub ids: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListUsersQuery {
    fn into_request(self) -> Result<ListUsersRequest> {
        let ids = parse_csv(self.ids.as_deref())
            .map_err(|bad| Error::UserValidation(format!("invalid user id: {bad}")))?;
        Ok(ListUsersRequest {
            ids,
            limit: self.limit.unwrap_or_default(),
            offset: self.offset.unwrap_or_default(),
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserBody>,
) -> Result<impl IntoResponse> {
    let user = state
        .users()
        .register_user(CreateUserRequest {
            first_name: body.first_name,
            last_name: body.last_name,
            age: body.age,
            is_married: body.is_married,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListResponse<UserResponse>>> {
    let req = query.into_request()?;
    let users = state.users().list_users(&req).await?;
    let total = state.users().count_users(&req).await?;
    Ok(Json(ListResponse {
        items: users.into_iter().map(UserResponse::from).collect(),
        total,
    }))
}
