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
use crate::models::{Service, ServiceCategory};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub category: ServiceCategory,
    pub active: bool,
    pub barbershop_id: Option<String>,
    pub image_url: Option<String>,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            price_cents: s.price_cents,
            duration_minutes: s.duration_minutes,
            category: s.category,
            active: s.active,
            barbershop_id: s.barbershop_id,
            image_url: s.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub category: String,
    pub active: Option<bool>,
    pub barbershop_id: Option<String>,
    pub image_url: Option<String>,
}

impl ServiceRequest {
    fn validate(&self) -> Result<ServiceCategory, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }
        if self.price_cents < 0 {
            return Err(AppError::BadRequest("priceCents must not be negative".to_string()));
        }
        if self.duration_minutes <= 0 {
            return Err(AppError::BadRequest("durationMinutes must be positive".to_string()));
        }
        parse_category(&self.category)
    }
}

fn parse_category(value: &str) -> Result<ServiceCategory, AppError> {
    ServiceCategory::parse(value)
        .ok_or_else(|| AppError::BadRequest(format!("invalid category '{value}'")))
}

// GET /api/services
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub active: Option<bool>,
    pub category: Option<String>,
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let category = query.category.as_deref().map(parse_category).transpose()?;
    let active = query.active;

    let services = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        Ok(queries::list_services(&conn, active, category)?)
    })
    .await?;
    Ok(Json(services.into_iter().map(ServiceResponse::from).collect()))
}

// GET /api/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceResponse>, AppError> {
    let service = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        queries::get_service(&conn, &id)?
            .ok_or_else(|| AppError::NotFound(format!("service {id}")))
    })
    .await?;
    Ok(Json(service.into()))
}

// POST /api/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<ServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), AppError> {
    actor.require_admin()?;
    let category = body.validate()?;

    let service = Service {
        id: Uuid::new_v4().to_string(),
        name: body.name,
        description: body.description,
        price_cents: body.price_cents,
        duration_minutes: body.duration_minutes,
        category,
        active: body.active.unwrap_or(true),
        barbershop_id: body.barbershop_id,
        image_url: body.image_url,
    };
    let service = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        queries::insert_service(&conn, &service)?;
        Ok(service)
    })
    .await?;

    tracing::info!(service_id = %service.id, "service created");
    Ok((StatusCode::CREATED, Json(service.into())))
}

// PUT /api/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<ServiceRequest>,
) -> Result<Json<ServiceResponse>, AppError> {
    actor.require_admin()?;
    let category = body.validate()?;

    let service = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        let existing = queries::get_service(&conn, &id)?
            .ok_or_else(|| AppError::NotFound(format!("service {id}")))?;
        let service = Service {
            name: body.name,
            description: body.description,
            price_cents: body.price_cents,
            duration_minutes: body.duration_minutes,
            category,
            active: body.active.unwrap_or(existing.active),
            barbershop_id: body.barbershop_id,
            image_url: body.image_url,
            ..existing
        };
        queries::update_service(&conn, &service)?;
        Ok(service)
    })
    .await?;
    Ok(Json(service.into()))
}

// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    actor.require_admin()?;

    blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        if queries::deactivate_service(&conn, &id)? {
            tracing::info!(service_id = %id, "service deactivated");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("service {id}")))
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
