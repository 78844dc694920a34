//! Appointment status state machine.
//!
//! ```text
//! PENDING_PAYMENT ──confirm──▶ CONFIRMED ──▶ COMPLETED
//!        │                         │
//!        └────────cancel───────────┴──────▶ CANCELLED
//! ```
//!
//! `COMPLETED` and `CANCELLED` are terminal on every path. `confirm` and `cancel`
//! carry the strict guards; `SetStatus` is the administrative edit that skips
//! them and re-stamps the target's timestamp each time it fires.

use chrono::NaiveDateTime;

use crate::errors::BookingError;
use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Confirm { payment_id: String },
    Cancel,
    SetStatus(AppointmentStatus),
}

impl Transition {
    pub fn target(&self) -> AppointmentStatus {
        match self {
            Transition::Confirm { .. } => AppointmentStatus::Confirmed,
            Transition::Cancel => AppointmentStatus::Cancelled,
            Transition::SetStatus(status) => *status,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transition::Confirm { .. } => "confirm",
            Transition::Cancel => "cancel",
            Transition::SetStatus(_) => "set_status",
        }
    }
}

/// Computes the record after `transition`, or why it is not allowed.
/// Pure: persisting the result is the caller's job.
pub fn apply(
    current: &Appointment,
    transition: &Transition,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    let from = current.status;
    let to = transition.target();
    let illegal = || BookingError::IllegalTransition { from, to };

    let mut next = current.clone();
    match transition {
        Transition::Confirm { payment_id } => {
            if from != AppointmentStatus::PendingPayment {
                return Err(illegal());
            }
            let payment_id = payment_id.trim();
            if payment_id.is_empty() {
                return Err(BookingError::InvariantViolation(
                    "payment id is required".to_string(),
                ));
            }
            next.payment_id = Some(payment_id.to_string());
            next.confirmed_at = Some(now);
        }
        Transition::Cancel => {
            if from.is_terminal() {
                return Err(illegal());
            }
            next.cancelled_at = Some(now);
        }
        Transition::SetStatus(target) => {
            if from.is_terminal() {
                return Err(illegal());
            }
            match target {
                AppointmentStatus::Confirmed => next.confirmed_at = Some(now),
                AppointmentStatus::Completed => next.completed_at = Some(now),
                AppointmentStatus::Cancelled => next.cancelled_at = Some(now),
                // Going back to pending would leave a stale confirmed_at behind.
                AppointmentStatus::PendingPayment => return Err(illegal()),
            }
        }
    }
    next.status = to;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: "a-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            user_id: "user-1".to_string(),
            service_id: "svc-1".to_string(),
            service_price_cents: 2500,
            barber_id: Some("b-1".to_string()),
            status,
            payment_id: None,
            created_at: ts("2024-02-20 12:00"),
            confirmed_at: None,
            cancelled_at: None,
            completed_at: None,
        }
    }

    fn confirm(payment_id: &str) -> Transition {
        Transition::Confirm {
            payment_id: payment_id.to_string(),
        }
    }

    #[test]
    fn test_confirm_pending() {
        let now = ts("2024-02-20 12:10");
        let next = apply(&appointment(AppointmentStatus::PendingPayment), &confirm("pay_123"), now).unwrap();
        assert_eq!(next.status, AppointmentStatus::Confirmed);
        assert_eq!(next.payment_id.as_deref(), Some("pay_123"));
        assert_eq!(next.confirmed_at, Some(now));
        assert_eq!(next.cancelled_at, None);
        assert_eq!(next.completed_at, None);
    }

    #[test]
    fn test_confirm_requires_payment_id() {
        let result = apply(
            &appointment(AppointmentStatus::PendingPayment),
            &confirm("   "),
            ts("2024-02-20 12:10"),
        );
        assert!(matches!(result, Err(BookingError::InvariantViolation(_))));
    }

    #[test]
    fn test_confirm_only_from_pending() {
        for status in [
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            let result = apply(&appointment(status), &confirm("pay_1"), ts("2024-02-20 12:10"));
            assert!(
                matches!(
                    result,
                    Err(BookingError::IllegalTransition { from, to: AppointmentStatus::Confirmed }) if from == status
                ),
                "confirm from {status} should be illegal"
            );
        }
    }

    #[test]
    fn test_confirm_checks_status_before_payment_id() {
        let result = apply(&appointment(AppointmentStatus::Cancelled), &confirm(""), ts("2024-02-20 12:10"));
        assert!(matches!(
            result,
            Err(BookingError::IllegalTransition {
                from: AppointmentStatus::Cancelled,
                to: AppointmentStatus::Confirmed,
            })
        ));
    }

    #[test]
    fn test_cancel_from_open_states() {
        let now = ts("2024-02-21 09:00");
        for status in [AppointmentStatus::PendingPayment, AppointmentStatus::Confirmed] {
            let next = apply(&appointment(status), &Transition::Cancel, now).unwrap();
            assert_eq!(next.status, AppointmentStatus::Cancelled);
            assert_eq!(next.cancelled_at, Some(now));
            assert_eq!(next.completed_at, None);
        }
    }

    #[test]
    fn test_cancel_terminal_is_illegal() {
        for status in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            let result = apply(&appointment(status), &Transition::Cancel, ts("2024-02-21 09:00"));
            assert!(matches!(result, Err(BookingError::IllegalTransition { .. })));
        }
    }

    #[test]
    fn test_set_status_skips_payment_guard() {
        let now = ts("2024-02-21 09:00");
        let next = apply(
            &appointment(AppointmentStatus::PendingPayment),
            &Transition::SetStatus(AppointmentStatus::Confirmed),
            now,
        )
        .unwrap();
        assert_eq!(next.status, AppointmentStatus::Confirmed);
        assert_eq!(next.payment_id, None);
        assert_eq!(next.confirmed_at, Some(now));
    }

    #[test]
    fn test_set_status_restamps_confirmed_at() {
        let mut confirmed = appointment(AppointmentStatus::Confirmed);
        confirmed.confirmed_at = Some(ts("2024-02-20 12:10"));

        let later = ts("2024-02-22 08:00");
        let next = apply(
            &confirmed,
            &Transition::SetStatus(AppointmentStatus::Confirmed),
            later,
        )
        .unwrap();
        assert_eq!(next.confirmed_at, Some(later));
    }

    #[test]
    fn test_set_status_completes_pending_directly() {
        let now = ts("2024-03-01 10:30");
        let next = apply(
            &appointment(AppointmentStatus::PendingPayment),
            &Transition::SetStatus(AppointmentStatus::Completed),
            now,
        )
        .unwrap();
        assert_eq!(next.status, AppointmentStatus::Completed);
        assert_eq!(next.completed_at, Some(now));
        assert_eq!(next.cancelled_at, None);
    }

    #[test]
    fn test_set_status_never_leaves_terminal_state() {
        for from in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            for to in [
                AppointmentStatus::Confirmed,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ] {
                let result = apply(&appointment(from), &Transition::SetStatus(to), ts("2024-03-02 09:00"));
                assert!(matches!(result, Err(BookingError::IllegalTransition { .. })));
            }
        }
    }

    #[test]
    fn test_set_status_to_pending_is_illegal() {
        let result = apply(
            &appointment(AppointmentStatus::Confirmed),
            &Transition::SetStatus(AppointmentStatus::PendingPayment),
            ts("2024-03-02 09:00"),
        );
        assert!(matches!(result, Err(BookingError::IllegalTransition { .. })));
    }

    #[test]
    fn test_apply_does_not_touch_snapshot_fields() {
        let current = appointment(AppointmentStatus::PendingPayment);
        let next = apply(&current, &confirm("pay_1"), ts("2024-02-20 12:10")).unwrap();
        assert_eq!(next.service_price_cents, current.service_price_cents);
        assert_eq!(next.created_at, current.created_at);
        assert_eq!(next.slot(), current.slot());
    }
}
