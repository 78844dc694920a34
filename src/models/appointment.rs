use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub user_id: String,
    pub service_id: String,
    /// Price of the service when the appointment was booked.
    pub service_price_cents: i64,
    pub barber_id: Option<String>,
    pub status: AppointmentStatus,
    pub payment_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub confirmed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

impl Appointment {
    pub fn slot(&self) -> Slot {
        Slot {
            date: self.date,
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    PendingPayment,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::PendingPayment => "pending_payment",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Case-insensitive; `None` for anything that is not a known status.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending_payment" => Some(AppointmentStatus::PendingPayment),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open `[start, end)` window on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        self.date == other.date && self.start < other.end && self.end > other.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slot(date: &str, start: &str, end: &str) -> Slot {
        Slot {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            start: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            AppointmentStatus::parse("CONFIRMED"),
            Some(AppointmentStatus::Confirmed)
        );
        assert_eq!(
            AppointmentStatus::parse("pending_payment"),
            Some(AppointmentStatus::PendingPayment)
        );
        assert_eq!(AppointmentStatus::parse("done"), None);
        assert_eq!(AppointmentStatus::parse(""), None);
    }

    #[test]
    fn test_status_round_trips_through_as_str() {
        for status in [
            AppointmentStatus::PendingPayment,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            assert_eq!(AppointmentStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(!AppointmentStatus::PendingPayment.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
    }

    #[test]
    fn test_overlapping_slots() {
        let a = slot("2024-03-01", "10:00", "10:30");
        let b = slot("2024-03-01", "10:15", "10:45");
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_adjacent_slots_do_not_overlap() {
        let a = slot("2024-03-01", "10:00", "10:30");
        let b = slot("2024-03-01", "10:30", "11:00");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_different_dates_do_not_overlap() {
        let a = slot("2024-03-01", "10:00", "10:30");
        let b = slot("2024-03-02", "10:00", "10:30");
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_inverted_slot_is_malformed() {
        assert!(!slot("2024-03-01", "11:00", "10:30").is_well_formed());
        assert!(!slot("2024-03-01", "10:30", "10:30").is_well_formed());
        assert!(slot("2024-03-01", "10:00", "10:30").is_well_formed());
    }

    fn minute_slot(start: u32, len: u32) -> Slot {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to_time = |m: u32| NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap();
        Slot {
            date,
            start: to_time(start),
            end: to_time(start + len),
        }
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(a in 0u32..1380, la in 1u32..60, b in 0u32..1380, lb in 1u32..60) {
            let x = minute_slot(a, la);
            let y = minute_slot(b, lb);
            prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
        }

        #[test]
        fn prop_slot_overlaps_itself(a in 0u32..1380, len in 1u32..60) {
            let x = minute_slot(a, len);
            prop_assert!(x.overlaps(&x));
        }
    }
}
