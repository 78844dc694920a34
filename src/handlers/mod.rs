pub mod appointments;
pub mod auth;
pub mod barbers;
pub mod health;
pub mod services;
pub mod users;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use chrono::{NaiveDate, NaiveTime};

use crate::errors::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route("/api/appointments/my", get(appointments::my_appointments))
        .route(
            "/api/appointments/user/:user_id",
            get(appointments::user_appointments),
        )
        .route(
            "/api/appointments/availability",
            get(appointments::check_availability),
        )
        .route("/api/appointments/:id", get(appointments::get_appointment))
        .route(
            "/api/appointments/:id/status",
            patch(appointments::update_status),
        )
        .route(
            "/api/appointments/:id/confirm",
            post(appointments::confirm_appointment),
        )
        .route(
            "/api/appointments/:id/cancel",
            post(appointments::cancel_appointment),
        )
        .route(
            "/api/barbers",
            get(barbers::list_barbers).post(barbers::create_barber),
        )
        .route(
            "/api/barbers/:id",
            get(barbers::get_barber)
                .put(barbers::update_barber)
                .delete(barbers::delete_barber),
        )
        .route(
            "/api/barbers/:id/appointments",
            get(barbers::barber_appointments),
        )
        .route(
            "/api/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/api/users/:id", get(users::get_user))
        .with_state(state)
}

/// Runs store work off the async executor; the scheduler may sleep between
/// retries and the connection mutex is a blocking lock.
pub(crate) async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, AppError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state)).await?
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date '{value}', expected YYYY-MM-DD")))
}

/// Accepts `HH:MM:SS` and `HH:MM`.
pub(crate) fn parse_time(value: &str) -> Result<NaiveTime, AppError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| AppError::BadRequest(format!("invalid time '{value}', expected HH:MM")))
}
