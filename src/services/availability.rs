use chrono::Timelike;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::BookingError;
use crate::models::Slot;

/// Rejects empty or inverted windows before they reach the store. Times are
/// stored at whole-second precision, so fractional seconds are refused too.
pub fn validate_slot(slot: &Slot) -> Result<(), BookingError> {
    if slot.start.nanosecond() != 0 || slot.end.nanosecond() != 0 {
        return Err(BookingError::InvariantViolation(
            "start and end times must be whole seconds".to_string(),
        ));
    }
    if !slot.is_well_formed() {
        return Err(BookingError::InvariantViolation(format!(
            "start time {} must be before end time {}",
            slot.start.format("%H:%M"),
            slot.end.format("%H:%M")
        )));
    }
    Ok(())
}

/// Whether `slot` is free. Scoped to one barber when `barber_id` is given,
/// otherwise any non-cancelled appointment on the date occupies the window.
pub fn is_available(
    conn: &Connection,
    slot: &Slot,
    barber_id: Option<&str>,
) -> Result<bool, BookingError> {
    validate_slot(slot)?;
    let taken = queries::has_conflict(conn, slot, barber_id)?;
    Ok(!taken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Appointment, AppointmentStatus};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn setup_db() -> Connection {
        db::init_db(":memory:", std::time::Duration::from_secs(1)).unwrap()
    }

    fn slot(start: &str, end: &str) -> Slot {
        Slot {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        }
    }

    fn book(conn: &Connection, id: &str, start: &str, end: &str, barber: Option<&str>) {
        let window = slot(start, end);
        let appt = Appointment {
            id: id.to_string(),
            date: window.date,
            start_time: window.start,
            end_time: window.end,
            user_id: "user-1".to_string(),
            service_id: "svc-1".to_string(),
            service_price_cents: 2000,
            barber_id: barber.map(str::to_string),
            status: AppointmentStatus::Confirmed,
            payment_id: Some("pay_1".to_string()),
            created_at: NaiveDateTime::parse_from_str("2024-02-01 08:00", "%Y-%m-%d %H:%M")
                .unwrap(),
            confirmed_at: None,
            cancelled_at: None,
            completed_at: None,
        };
        queries::insert_appointment(conn, &appt).unwrap();
    }

    #[test]
    fn test_empty_day_is_available() {
        let conn = setup_db();
        assert!(is_available(&conn, &slot("10:00", "10:30"), Some("b-1")).unwrap());
        assert!(is_available(&conn, &slot("10:00", "10:30"), None).unwrap());
    }

    #[test]
    fn test_overlap_makes_slot_unavailable() {
        let conn = setup_db();
        book(&conn, "a-1", "10:00", "10:30", Some("b-1"));

        assert!(!is_available(&conn, &slot("10:15", "10:45"), Some("b-1")).unwrap());
        assert!(!is_available(&conn, &slot("09:45", "10:15"), Some("b-1")).unwrap());
        assert!(!is_available(&conn, &slot("09:00", "12:00"), Some("b-1")).unwrap());
        assert!(is_available(&conn, &slot("10:15", "10:45"), Some("b-2")).unwrap());
    }

    #[test]
    fn test_global_check_sees_every_barber() {
        let conn = setup_db();
        book(&conn, "a-1", "10:00", "10:30", Some("b-1"));
        assert!(!is_available(&conn, &slot("10:00", "10:30"), None).unwrap());
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let conn = setup_db();
        let result = is_available(&conn, &slot("11:00", "10:30"), Some("b-1"));
        assert!(matches!(result, Err(BookingError::InvariantViolation(_))));

        let result = is_available(&conn, &slot("10:30", "10:30"), None);
        assert!(matches!(result, Err(BookingError::InvariantViolation(_))));
    }

    #[test]
    fn test_fractional_seconds_are_rejected() {
        let window = Slot {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start: NaiveTime::from_hms_milli_opt(10, 0, 0, 200).unwrap(),
            end: NaiveTime::from_hms_milli_opt(10, 0, 0, 800).unwrap(),
        };
        assert!(matches!(
            validate_slot(&window),
            Err(BookingError::InvariantViolation(_))
        ));

        let whole_start = Slot {
            start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            ..window
        };
        assert!(matches!(
            validate_slot(&whole_start),
            Err(BookingError::InvariantViolation(_))
        ));
    }
}
