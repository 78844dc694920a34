use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::db::{self, queries, Db};
use crate::errors::BookingError;
use crate::models::{Appointment, AppointmentStatus, Slot};
use crate::services::availability;
use crate::services::catalog::{ResourceLookup, ServiceLookup, SqliteCatalog, UserLookup};
use crate::services::clock::Clock;
use crate::services::lifecycle::{self, Transition};
use crate::services::retry::{retry_on_conflict, RetryPolicy};

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub user_id: String,
    pub service_id: String,
    pub barber_id: Option<String>,
}

impl NewAppointment {
    pub fn slot(&self) -> Slot {
        Slot {
            date: self.date,
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// An appointment together with the catalog names it refers to. A name is
/// `None` when the catalog no longer knows the id.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentDetails {
    pub appointment: Appointment,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub service_name: Option<String>,
    pub barber_name: Option<String>,
}

/// Books appointments and moves them through their lifecycle.
///
/// Every write runs as one `BEGIN IMMEDIATE` transaction: SQLite hands out its
/// single write lock before the availability query runs, so no other connection
/// can insert between the check and the insert.
pub struct Scheduler {
    db: Db,
    users: Arc<dyn UserLookup>,
    services: Arc<dyn ServiceLookup>,
    barbers: Arc<dyn ResourceLookup>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl Scheduler {
    /// Scheduler whose catalog lives in the same database.
    pub fn new(db: Db, clock: Arc<dyn Clock>, retry: RetryPolicy) -> Self {
        let catalog = Arc::new(SqliteCatalog::new(Arc::clone(&db)));
        Self {
            db,
            users: catalog.clone(),
            services: catalog.clone(),
            barbers: catalog,
            clock,
            retry,
        }
    }

    pub fn with_catalog(
        db: Db,
        users: Arc<dyn UserLookup>,
        services: Arc<dyn ServiceLookup>,
        barbers: Arc<dyn ResourceLookup>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            db,
            users,
            services,
            barbers,
            clock,
            retry,
        }
    }

    pub fn list_appointments(
        &self,
        date: Option<NaiveDate>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let conn = db::lock(&self.db);
        Ok(queries::list_appointments(&conn, date, status)?)
    }

    pub fn list_appointments_for_user(&self, user_id: &str) -> Result<Vec<Appointment>, BookingError> {
        let conn = db::lock(&self.db);
        Ok(queries::list_appointments_for_user(&conn, user_id)?)
    }

    pub fn list_appointments_for_barber(
        &self,
        barber_id: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let conn = db::lock(&self.db);
        Ok(queries::list_appointments_for_barber(&conn, barber_id)?)
    }

    pub fn get_appointment(&self, id: &str) -> Result<Appointment, BookingError> {
        let conn = db::lock(&self.db);
        queries::get_appointment(&conn, id)?.ok_or_else(|| BookingError::not_found("appointment", id))
    }

    /// Resolves the user, service and barber names through the catalog.
    pub fn describe(&self, appointment: Appointment) -> Result<AppointmentDetails, BookingError> {
        let user = self.users.user_by_id(&appointment.user_id)?;
        let service = self.services.service_by_id(&appointment.service_id)?;
        let barber = match &appointment.barber_id {
            Some(id) => self.barbers.barber_by_id(id)?,
            None => None,
        };
        Ok(AppointmentDetails {
            user_name: user.as_ref().map(|u| u.name.clone()),
            user_email: user.map(|u| u.email),
            service_name: service.map(|s| s.name),
            barber_name: barber.map(|b| b.name),
            appointment,
        })
    }

    pub fn check_availability(
        &self,
        slot: &Slot,
        barber_id: Option<&str>,
    ) -> Result<bool, BookingError> {
        availability::validate_slot(slot)?;
        let conn = db::lock(&self.db);
        availability::is_available(&conn, slot, barber_id)
    }

    pub fn create_appointment(&self, request: NewAppointment) -> Result<Appointment, BookingError> {
        let slot = request.slot();
        availability::validate_slot(&slot)?;

        if self.users.user_by_id(&request.user_id)?.is_none() {
            return Err(BookingError::not_found("user", &request.user_id));
        }
        let service = self
            .services
            .service_by_id(&request.service_id)?
            .ok_or_else(|| BookingError::not_found("service", &request.service_id))?;
        if let Some(barber_id) = &request.barber_id {
            let barber = self
                .barbers
                .barber_by_id(barber_id)?
                .ok_or_else(|| BookingError::not_found("barber", barber_id))?;
            if !barber.active {
                return Err(BookingError::BarberInactive(barber_id.clone()));
            }
        }

        let appointment = retry_on_conflict(&self.retry, "create_appointment", || {
            let mut conn = db::lock(&self.db);
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !availability::is_available(&tx, &slot, request.barber_id.as_deref())? {
                tracing::warn!(
                    date = %slot.date,
                    start = %slot.start,
                    end = %slot.end,
                    barber_id = ?request.barber_id,
                    "slot unavailable"
                );
                return Err(BookingError::SlotUnavailable);
            }

            let appointment = Appointment {
                id: Uuid::new_v4().to_string(),
                date: slot.date,
                start_time: slot.start,
                end_time: slot.end,
                user_id: request.user_id.clone(),
                service_id: request.service_id.clone(),
                service_price_cents: service.price_cents,
                barber_id: request.barber_id.clone(),
                status: AppointmentStatus::PendingPayment,
                payment_id: None,
                created_at: self.clock.timestamp(),
                confirmed_at: None,
                cancelled_at: None,
                completed_at: None,
            };
            queries::insert_appointment(&tx, &appointment)?;
            tx.commit()?;
            Ok(appointment)
        })?;

        tracing::info!(
            appointment_id = %appointment.id,
            date = %appointment.date,
            start = %appointment.start_time,
            end = %appointment.end_time,
            barber_id = ?appointment.barber_id,
            "appointment created"
        );
        Ok(appointment)
    }

    pub fn confirm_appointment(&self, id: &str, payment_id: &str) -> Result<Appointment, BookingError> {
        self.transition(
            id,
            Transition::Confirm {
                payment_id: payment_id.to_string(),
            },
        )
    }

    pub fn cancel_appointment(&self, id: &str) -> Result<(), BookingError> {
        self.transition(id, Transition::Cancel).map(|_| ())
    }

    /// Administrative status edit; `status` is matched case-insensitively.
    pub fn set_appointment_status(&self, id: &str, status: &str) -> Result<Appointment, BookingError> {
        // An unknown id is reported before a bad status string.
        self.get_appointment(id)?;
        let target = AppointmentStatus::parse(status)
            .ok_or_else(|| BookingError::InvalidStatus(status.to_string()))?;
        self.transition(id, Transition::SetStatus(target))
    }

    fn transition(&self, id: &str, transition: Transition) -> Result<Appointment, BookingError> {
        let updated = retry_on_conflict(&self.retry, transition.name(), || {
            let mut conn = db::lock(&self.db);
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let next = self.apply_in(&tx, id, &transition)?;
            tx.commit()?;
            Ok(next)
        })?;

        tracing::info!(
            appointment_id = %updated.id,
            transition = transition.name(),
            status = %updated.status,
            "appointment transitioned"
        );
        Ok(updated)
    }

    fn apply_in(
        &self,
        conn: &Connection,
        id: &str,
        transition: &Transition,
    ) -> Result<Appointment, BookingError> {
        let current = queries::get_appointment(conn, id)?
            .ok_or_else(|| BookingError::not_found("appointment", id))?;
        let next = lifecycle::apply(&current, transition, self.clock.timestamp())?;
        if !queries::update_appointment_state(conn, &next, current.status)? {
            return Err(BookingError::StaleWrite);
        }
        Ok(next)
    }
}
