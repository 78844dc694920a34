use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rusqlite::ErrorCode;

use crate::models::AppointmentStatus;

/// Failures of the scheduling core. Every variant leaves the store untouched.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("the selected time slot is not available")]
    SlotUnavailable,

    #[error("cannot move appointment from {from} to {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid request: {0}")]
    InvariantViolation(String),

    #[error("barber {0} is not active")]
    BarberInactive(String),

    /// A compare-and-set lost against a concurrent writer.
    #[error("appointment was modified concurrently")]
    StaleWrite,

    #[error("store busy after {attempts} attempts, try again")]
    StoreBusy { attempts: usize },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        BookingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Store-level write conflicts that a fresh attempt may get past.
    pub fn is_transient(&self) -> bool {
        match self {
            BookingError::StaleWrite => true,
            BookingError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Booking(e) => match e {
                BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
                BookingError::SlotUnavailable => StatusCode::CONFLICT,
                BookingError::IllegalTransition { .. } => StatusCode::CONFLICT,
                BookingError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
                BookingError::InvariantViolation(_) => StatusCode::BAD_REQUEST,
                BookingError::BarberInactive(_) => StatusCode::UNPROCESSABLE_ENTITY,
                BookingError::StaleWrite => StatusCode::CONFLICT,
                BookingError::StoreBusy { .. } => StatusCode::SERVICE_UNAVAILABLE,
                BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_and_stale_write_are_transient() {
        assert!(BookingError::StaleWrite.is_transient());
        assert!(BookingError::Database(sqlite_failure(rusqlite::ffi::SQLITE_BUSY)).is_transient());
        assert!(
            BookingError::Database(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED)).is_transient()
        );
    }

    #[test]
    fn test_domain_errors_are_not_transient() {
        assert!(!BookingError::SlotUnavailable.is_transient());
        assert!(!BookingError::not_found("appointment", "a-1").is_transient());
        assert!(!BookingError::StoreBusy { attempts: 3 }.is_transient());
        assert!(
            !BookingError::Database(sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT))
                .is_transient()
        );
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                AppError::from(BookingError::SlotUnavailable),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(BookingError::not_found("user", "u-1")),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(BookingError::InvalidStatus("done".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(BookingError::StoreBusy { attempts: 5 }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
