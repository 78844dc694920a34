use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::models::{
    Appointment, AppointmentStatus, Barber, Role, Service, ServiceCategory, Slot, User,
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, date, start_time, end_time, user_id, service_id, service_price_cents, \
     barber_id, status, payment_id, created_at, confirmed_at, cancelled_at, completed_at";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, date, start_time, end_time, user_id, service_id, service_price_cents,
                                   barber_id, status, payment_id, created_at, confirmed_at, cancelled_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            appt.id,
            format_date(&appt.date),
            format_time(&appt.start_time),
            format_time(&appt.end_time),
            appt.user_id,
            appt.service_id,
            appt.service_price_cents,
            appt.barber_id,
            appt.status.as_str(),
            appt.payment_id,
            format_timestamp(&appt.created_at),
            appt.confirmed_at.as_ref().map(format_timestamp),
            appt.cancelled_at.as_ref().map(format_timestamp),
            appt.completed_at.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &str) -> rusqlite::Result<Option<Appointment>> {
    let result = conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
        params![id],
        parse_appointment_row,
    );

    match result {
        Ok(appt) => Ok(Some(appt)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn list_appointments(
    conn: &Connection,
    date: Option<NaiveDate>,
    status: Option<AppointmentStatus>,
) -> rusqlite::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE (?1 IS NULL OR date = ?1) AND (?2 IS NULL OR status = ?2)
         ORDER BY date ASC, start_time ASC, created_at ASC"
    ))?;

    let rows = stmt.query_map(
        params![date.as_ref().map(format_date), status.map(|s| s.as_str())],
        parse_appointment_row,
    )?;
    rows.collect()
}

pub fn list_appointments_for_user(
    conn: &Connection,
    user_id: &str,
) -> rusqlite::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE user_id = ?1
         ORDER BY date ASC, start_time ASC, created_at ASC"
    ))?;
    let rows = stmt.query_map(params![user_id], parse_appointment_row)?;
    rows.collect()
}

pub fn list_appointments_for_barber(
    conn: &Connection,
    barber_id: &str,
) -> rusqlite::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE barber_id = ?1
         ORDER BY date ASC, start_time ASC, created_at ASC"
    ))?;
    let rows = stmt.query_map(params![barber_id], parse_appointment_row)?;
    rows.collect()
}

/// True when a non-cancelled appointment on the slot's date overlaps `[start, end)`.
/// With `barber_id` set only that barber's appointments count; without it every
/// appointment on the date does.
pub fn has_conflict(
    conn: &Connection,
    slot: &Slot,
    barber_id: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM appointments
            WHERE date = ?1
              AND status != 'cancelled'
              AND (?4 IS NULL OR barber_id = ?4)
              AND start_time < ?3
              AND end_time > ?2
         )",
        params![
            format_date(&slot.date),
            format_time(&slot.start),
            format_time(&slot.end),
            barber_id,
        ],
        |row| row.get(0),
    )
}

/// Persists status, payment reference and lifecycle timestamps, but only if the
/// stored status still equals `expected`. Returns false when the row moved on.
pub fn update_appointment_state(
    conn: &Connection,
    appt: &Appointment,
    expected: AppointmentStatus,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments
         SET status = ?1, payment_id = ?2, confirmed_at = ?3, cancelled_at = ?4, completed_at = ?5
         WHERE id = ?6 AND status = ?7",
        params![
            appt.status.as_str(),
            appt.payment_id,
            appt.confirmed_at.as_ref().map(format_timestamp),
            appt.cancelled_at.as_ref().map(format_timestamp),
            appt.completed_at.as_ref().map(format_timestamp),
            appt.id,
            expected.as_str(),
        ],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &Row) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        date: parse_text(row, 1, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))?,
        start_time: parse_text(row, 2, |s| NaiveTime::parse_from_str(s, TIME_FORMAT))?,
        end_time: parse_text(row, 3, |s| NaiveTime::parse_from_str(s, TIME_FORMAT))?,
        user_id: row.get(4)?,
        service_id: row.get(5)?,
        service_price_cents: row.get(6)?,
        barber_id: row.get(7)?,
        status: parse_text(row, 8, |s| {
            AppointmentStatus::parse(s).ok_or_else(|| format!("unknown appointment status: {s}"))
        })?,
        payment_id: row.get(9)?,
        created_at: parse_timestamp(row, 10)?,
        confirmed_at: parse_optional_timestamp(row, 11)?,
        cancelled_at: parse_optional_timestamp(row, 12)?,
        completed_at: parse_optional_timestamp(row, 13)?,
    })
}

// ── Barbers ──

const BARBER_COLUMNS: &str =
    "id, name, email, phone, specialty, active, commission_percentage, created_at";

pub fn insert_barber(conn: &Connection, barber: &Barber) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO barbers (id, name, email, phone, specialty, active, commission_percentage, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            barber.id,
            barber.name,
            barber.email,
            barber.phone,
            barber.specialty,
            barber.active,
            barber.commission_percentage,
            format_timestamp(&barber.created_at),
        ],
    )?;
    Ok(())
}

pub fn update_barber(conn: &Connection, barber: &Barber) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE barbers SET name = ?1, email = ?2, phone = ?3, specialty = ?4, active = ?5, commission_percentage = ?6
         WHERE id = ?7",
        params![
            barber.name,
            barber.email,
            barber.phone,
            barber.specialty,
            barber.active,
            barber.commission_percentage,
            barber.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_barber(conn: &Connection, id: &str) -> rusqlite::Result<Option<Barber>> {
    let result = conn.query_row(
        &format!("SELECT {BARBER_COLUMNS} FROM barbers WHERE id = ?1"),
        params![id],
        parse_barber_row,
    );

    match result {
        Ok(barber) => Ok(Some(barber)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn list_barbers(conn: &Connection, active: Option<bool>) -> rusqlite::Result<Vec<Barber>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BARBER_COLUMNS} FROM barbers WHERE (?1 IS NULL OR active = ?1) ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![active], parse_barber_row)?;
    rows.collect()
}

/// Whether another barber (not `except_id`) already uses `email`.
pub fn barber_email_taken(
    conn: &Connection,
    email: &str,
    except_id: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM barbers WHERE email = ?1 AND (?2 IS NULL OR id != ?2))",
        params![email, except_id],
        |row| row.get(0),
    )
}

pub fn deactivate_barber(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("UPDATE barbers SET active = 0 WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_barber_row(row: &Row) -> rusqlite::Result<Barber> {
    Ok(Barber {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        specialty: row.get(4)?,
        active: row.get(5)?,
        commission_percentage: row.get(6)?,
        created_at: parse_timestamp(row, 7)?,
    })
}

// ── Services ──

const SERVICE_COLUMNS: &str =
    "id, name, description, price_cents, duration_minutes, category, active, barbershop_id, image_url";

pub fn insert_service(conn: &Connection, service: &Service) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, description, price_cents, duration_minutes, category, active, barbershop_id, image_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            service.id,
            service.name,
            service.description,
            service.price_cents,
            service.duration_minutes,
            service.category.as_str(),
            service.active,
            service.barbershop_id,
            service.image_url,
        ],
    )?;
    Ok(())
}

pub fn update_service(conn: &Connection, service: &Service) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, price_cents = ?3, duration_minutes = ?4,
                             category = ?5, active = ?6, barbershop_id = ?7, image_url = ?8
         WHERE id = ?9",
        params![
            service.name,
            service.description,
            service.price_cents,
            service.duration_minutes,
            service.category.as_str(),
            service.active,
            service.barbershop_id,
            service.image_url,
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_service(conn: &Connection, id: &str) -> rusqlite::Result<Option<Service>> {
    let result = conn.query_row(
        &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
        params![id],
        parse_service_row,
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn list_services(
    conn: &Connection,
    active: Option<bool>,
    category: Option<ServiceCategory>,
) -> rusqlite::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services
         WHERE (?1 IS NULL OR active = ?1) AND (?2 IS NULL OR category = ?2)
         ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(
        params![active, category.map(|c| c.as_str())],
        parse_service_row,
    )?;
    rows.collect()
}

pub fn deactivate_service(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("UPDATE services SET active = 0 WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_service_row(row: &Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price_cents: row.get(3)?,
        duration_minutes: row.get(4)?,
        category: parse_text(row, 5, |s| {
            ServiceCategory::parse(s).ok_or_else(|| format!("unknown service category: {s}"))
        })?,
        active: row.get(6)?,
        barbershop_id: row.get(7)?,
        image_url: row.get(8)?,
    })
}

// ── Users ──

pub fn insert_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    let (barbershop_name, address) = match &user.role {
        Role::Admin {
            barbershop_name,
            address,
        } => (barbershop_name.as_deref(), address.as_deref()),
        Role::Scheduler => (None, None),
    };

    conn.execute(
        "INSERT INTO users (id, name, email, phone, role, barbershop_name, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.name,
            user.email,
            user.phone,
            user.role.as_str(),
            barbershop_name,
            address,
            format_timestamp(&user.created_at),
        ],
    )?;
    Ok(())
}

const USER_COLUMNS: &str = "id, name, email, phone, role, barbershop_name, address, created_at";

pub fn get_user(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, name ASC"
    ))?;
    let rows = stmt.query_map([], parse_user_row)?;
    rows.collect()
}

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(4)?;
    let role = match role_str.as_str() {
        "admin" => Role::Admin {
            barbershop_name: row.get(5)?,
            address: row.get(6)?,
        },
        "scheduler" => Role::Scheduler,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("unknown role: {other}").into(),
            ))
        }
    };
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        role,
        created_at: parse_timestamp(row, 7)?,
    })
}

pub fn user_email_taken(conn: &Connection, email: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1)",
        params![email],
        |row| row.get(0),
    )
}

// ── Formatting ──

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_text<T, E>(
    row: &Row,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    parse_text(row, idx, |s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT))
}

fn parse_optional_timestamp(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })
    })
    .transpose()
}
