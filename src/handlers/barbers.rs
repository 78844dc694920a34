use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::handlers::appointments::{self, AppointmentResponse};
use crate::handlers::auth::Actor;
use crate::handlers::blocking;
use crate::models::Barber;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarberResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    pub active: bool,
    pub commission_percentage: f64,
    pub created_at: String,
}

impl From<Barber> for BarberResponse {
    fn from(b: Barber) -> Self {
        Self {
            created_at: queries::format_timestamp(&b.created_at),
            id: b.id,
            name: b.name,
            email: b.email,
            phone: b.phone,
            specialty: b.specialty,
            active: b.active,
            commission_percentage: b.commission_percentage,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarberRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    pub active: Option<bool>,
    pub commission_percentage: Option<f64>,
}

impl BarberRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AppError::BadRequest(format!("invalid email '{}'", self.email)));
        }
        if let Some(pct) = self.commission_percentage {
            if !(0.0..=100.0).contains(&pct) {
                return Err(AppError::BadRequest(
                    "commissionPercentage must be between 0 and 100".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// GET /api/barbers
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub active: Option<bool>,
}

pub async fn list_barbers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BarberResponse>>, AppError> {
    let barbers = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        Ok(queries::list_barbers(&conn, query.active)?)
    })
    .await?;
    Ok(Json(barbers.into_iter().map(BarberResponse::from).collect()))
}

// GET /api/barbers/:id
pub async fn get_barber(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BarberResponse>, AppError> {
    let barber = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        queries::get_barber(&conn, &id)?
            .ok_or_else(|| AppError::NotFound(format!("barber {id}")))
    })
    .await?;
    Ok(Json(barber.into()))
}

// GET /api/barbers/:id/appointments
pub async fn barber_appointments(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    actor.require_admin()?;

    let appointments = blocking(&state, move |s| {
        let found = s.scheduler.list_appointments_for_barber(&id)?;
        appointments::respond_many(&s.scheduler, found)
    })
    .await?;
    Ok(Json(appointments))
}

// POST /api/barbers
pub async fn create_barber(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<BarberRequest>,
) -> Result<(StatusCode, Json<BarberResponse>), AppError> {
    actor.require_admin()?;
    body.validate()?;

    let barber = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        if queries::barber_email_taken(&conn, &body.email, None)? {
            return Err(AppError::Conflict(format!("email {} already in use", body.email)));
        }
        let barber = Barber {
            id: Uuid::new_v4().to_string(),
            name: body.name,
            email: body.email,
            phone: body.phone,
            specialty: body.specialty,
            active: body.active.unwrap_or(true),
            commission_percentage: body.commission_percentage.unwrap_or(0.0),
            created_at: s.clock.timestamp(),
        };
        queries::insert_barber(&conn, &barber)?;
        Ok(barber)
    })
    .await?;

    tracing::info!(barber_id = %barber.id, "barber created");
    Ok((StatusCode::CREATED, Json(barber.into())))
}

// PUT /api/barbers/:id
pub async fn update_barber(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<BarberRequest>,
) -> Result<Json<BarberResponse>, AppError> {
    actor.require_admin()?;
    body.validate()?;

    let barber = blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        let existing = queries::get_barber(&conn, &id)?
            .ok_or_else(|| AppError::NotFound(format!("barber {id}")))?;
        if queries::barber_email_taken(&conn, &body.email, Some(&id))? {
            return Err(AppError::Conflict(format!("email {} already in use", body.email)));
        }
        let barber = Barber {
            name: body.name,
            email: body.email,
            phone: body.phone,
            specialty: body.specialty,
            active: body.active.unwrap_or(existing.active),
            commission_percentage: body
                .commission_percentage
                .unwrap_or(existing.commission_percentage),
            ..existing
        };
        queries::update_barber(&conn, &barber)?;
        Ok(barber)
    })
    .await?;
    Ok(Json(barber.into()))
}

// DELETE /api/barbers/:id
pub async fn delete_barber(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    actor.require_admin()?;

    blocking(&state, move |s| {
        let conn = db::lock(&s.db);
        if queries::deactivate_barber(&conn, &id)? {
            tracing::info!(barber_id = %id, "barber deactivated");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("barber {id}")))
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
