use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::{format_date, format_time, format_timestamp};
use crate::errors::{AppError, BookingError};
use crate::handlers::auth::Actor;
use crate::handlers::{blocking, parse_date, parse_time};
use crate::models::{Appointment, AppointmentStatus, Slot};
use crate::services::scheduling::{AppointmentDetails, NewAppointment, Scheduler};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: String,
    pub date: String,
    /// Display range, `HH:MM - HH:MM`.
    pub time: String,
    pub start_time: String,
    pub end_time: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub service_id: String,
    pub service_name: Option<String>,
    pub service_price_cents: i64,
    pub barber_id: Option<String>,
    pub barber_name: Option<String>,
    pub status: AppointmentStatus,
    pub payment_id: Option<String>,
    pub created_at: String,
    pub confirmed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub completed_at: Option<String>,
}

impl From<AppointmentDetails> for AppointmentResponse {
    fn from(details: AppointmentDetails) -> Self {
        let a = details.appointment;
        Self {
            time: format!(
                "{} - {}",
                a.start_time.format("%H:%M"),
                a.end_time.format("%H:%M")
            ),
            date: format_date(&a.date),
            start_time: format_time(&a.start_time),
            end_time: format_time(&a.end_time),
            created_at: format_timestamp(&a.created_at),
            confirmed_at: a.confirmed_at.as_ref().map(format_timestamp),
            cancelled_at: a.cancelled_at.as_ref().map(format_timestamp),
            completed_at: a.completed_at.as_ref().map(format_timestamp),
            id: a.id,
            user_id: a.user_id,
            user_name: details.user_name,
            user_email: details.user_email,
            service_id: a.service_id,
            service_name: details.service_name,
            service_price_cents: a.service_price_cents,
            barber_id: a.barber_id,
            barber_name: details.barber_name,
            status: a.status,
            payment_id: a.payment_id,
        }
    }
}

/// Builds the response for one appointment, names resolved through the catalog.
pub(crate) fn respond(
    scheduler: &Scheduler,
    appointment: Appointment,
) -> Result<AppointmentResponse, AppError> {
    Ok(scheduler.describe(appointment)?.into())
}

pub(crate) fn respond_many(
    scheduler: &Scheduler,
    appointments: Vec<Appointment>,
) -> Result<Vec<AppointmentResponse>, AppError> {
    appointments
        .into_iter()
        .map(|a| respond(scheduler, a))
        .collect()
}

// GET /api/appointments
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub date: Option<String>,
    pub status: Option<String>,
}

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    actor.require_admin()?;

    let date = query.date.as_deref().map(parse_date).transpose()?;
    let status = query
        .status
        .as_deref()
        .map(|s| AppointmentStatus::parse(s).ok_or_else(|| BookingError::InvalidStatus(s.to_string())))
        .transpose()?;

    let appointments = blocking(&state, move |s| {
        let found = s.scheduler.list_appointments(date, status)?;
        respond_many(&s.scheduler, found)
    })
    .await?;
    Ok(Json(appointments))
}

// GET /api/appointments/my
pub async fn my_appointments(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let user_id = actor
        .user_id()
        .ok_or_else(|| AppError::BadRequest("x-user-id header is required".to_string()))?
        .to_string();

    let appointments = blocking(&state, move |s| {
        let found = s.scheduler.list_appointments_for_user(&user_id)?;
        respond_many(&s.scheduler, found)
    })
    .await?;
    Ok(Json(appointments))
}

// GET /api/appointments/user/:user_id
pub async fn user_appointments(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    actor.require_access(&user_id)?;

    let appointments = blocking(&state, move |s| {
        let found = s.scheduler.list_appointments_for_user(&user_id)?;
        respond_many(&s.scheduler, found)
    })
    .await?;
    Ok(Json(appointments))
}

// GET /api/appointments/availability
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub barber_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let required = |value: Option<String>, name: &str| {
        value.ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
    };
    let slot = Slot {
        date: parse_date(&required(query.date, "date")?)?,
        start: parse_time(&required(query.start_time, "startTime")?)?,
        end: parse_time(&required(query.end_time, "endTime")?)?,
    };
    let barber_id = query.barber_id.filter(|id| !id.is_empty());

    let available = blocking(&state, move |s| {
        Ok(s.scheduler.check_availability(&slot, barber_id.as_deref())?)
    })
    .await?;
    Ok(Json(AvailabilityResponse { available }))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment = blocking(&state, move |s| {
        let found = s.scheduler.get_appointment(&id)?;
        actor.require_access(&found.user_id)?;
        respond(&s.scheduler, found)
    })
    .await?;
    Ok(Json(appointment))
}

// POST /api/appointments
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    /// Defaults to the caller.
    pub user_id: Option<String>,
    pub service_id: String,
    pub barber_id: Option<String>,
}

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let user_id = body
        .user_id
        .or_else(|| actor.user_id().map(str::to_string))
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;
    actor.require_access(&user_id)?;

    let request = NewAppointment {
        date: parse_date(&body.date)?,
        start_time: parse_time(&body.start_time)?,
        end_time: parse_time(&body.end_time)?,
        user_id,
        service_id: body.service_id,
        barber_id: body.barber_id.filter(|id| !id.is_empty()),
    };

    let appointment = blocking(&state, move |s| {
        let created = s.scheduler.create_appointment(request)?;
        respond(&s.scheduler, created)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Loads the appointment and checks the caller may act on it.
async fn authorize(state: &Arc<AppState>, actor: &Actor, id: &str) -> Result<(), AppError> {
    if actor.is_admin() {
        return Ok(());
    }
    let id = id.to_string();
    let appointment = blocking(state, move |s| Ok(s.scheduler.get_appointment(&id)?)).await?;
    actor.require_access(&appointment.user_id)
}

// PATCH /api/appointments/:id/status
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    authorize(&state, &actor, &id).await?;

    let appointment = blocking(&state, move |s| {
        let updated = s.scheduler.set_appointment_status(&id, &body.status)?;
        respond(&s.scheduler, updated)
    })
    .await?;
    Ok(Json(appointment))
}

// POST /api/appointments/:id/confirm
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub payment_id: String,
}

pub async fn confirm_appointment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<ConfirmRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    authorize(&state, &actor, &id).await?;

    let appointment = blocking(&state, move |s| {
        let confirmed = s.scheduler.confirm_appointment(&id, &body.payment_id)?;
        respond(&s.scheduler, confirmed)
    })
    .await?;
    Ok(Json(appointment))
}

// POST /api/appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    authorize(&state, &actor, &id).await?;

    blocking(&state, move |s| Ok(s.scheduler.cancel_appointment(&id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}
