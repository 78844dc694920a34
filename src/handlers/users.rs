use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::handlers::auth::Actor;
use crate::handlers::blocking;
use crate::models::{Role, User};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            created_at: queries::format_timestamp(&u.created_at),
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            role: u.role,
        }
    }
}

/// `{"name", "email", "phone"?, "role": "admin" | "scheduler", ...admin fields}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub role: Role,
}

// POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    actor.require_admin()?;
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if !body.email.contains('@') {
        return Err(AppError::BadRequest(format!("invalid email '{}'", body.email)));
    }

    let user = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        if queries::user_email_taken(&conn, &body.email)? {
            return Err(AppError::Conflict(format!("email {} already in use", body.email)));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: body.name,
            email: body.email,
            phone: body.phone,
            role: body.role,
            created_at: s.clock.timestamp(),
        };
        queries::insert_user(&conn, &user)?;
        Ok(user)
    })
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

// GET /api/users
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `admin` or `scheduler`
    pub role: Option<String>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    actor.require_admin()?;

    let admins_only = match query.role.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => None,
        Some("admin") => Some(true),
        Some("scheduler") => Some(false),
        Some(other) => return Err(AppError::BadRequest(format!("invalid role '{other}'"))),
    };

    let users = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        Ok(queries::list_users(&conn)?)
    })
    .await?;

    Ok(Json(
        users
            .into_iter()
            .filter(|u| admins_only.map_or(true, |admin| u.role.is_admin() == admin))
            .map(UserResponse::from)
            .collect(),
    ))
}

// GET /api/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    actor.require_admin()?;

    let user = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        queries::get_user(&conn, &id)?.ok_or_else(|| AppError::NotFound(format!("user {id}")))
    })
    .await?;
    Ok(Json(user.into()))
}
