//! Read-only views of the catalog the scheduler depends on. Users, services and
//! barbers are owned elsewhere; the scheduler only needs to resolve ids.

use crate::db::{self, queries, Db};
use crate::errors::BookingError;
use crate::models::{Barber, Service, User};

pub trait UserLookup: Send + Sync {
    fn user_by_id(&self, id: &str) -> Result<Option<User>, BookingError>;
}

pub trait ServiceLookup: Send + Sync {
    fn service_by_id(&self, id: &str) -> Result<Option<Service>, BookingError>;
}

/// Barbers are the bookable resources.
pub trait ResourceLookup: Send + Sync {
    fn barber_by_id(&self, id: &str) -> Result<Option<Barber>, BookingError>;
}

/// Catalog backed by the same SQLite database as the appointments.
#[derive(Clone)]
pub struct SqliteCatalog {
    db: Db,
}

impl SqliteCatalog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl UserLookup for SqliteCatalog {
    fn user_by_id(&self, id: &str) -> Result<Option<User>, BookingError> {
        let conn = db::lock(&self.db);
        Ok(queries::get_user(&conn, id)?)
    }
}

impl ServiceLookup for SqliteCatalog {
    fn service_by_id(&self, id: &str) -> Result<Option<Service>, BookingError> {
        let conn = db::lock(&self.db);
        Ok(queries::get_service(&conn, id)?)
    }
}

impl ResourceLookup for SqliteCatalog {
    fn barber_by_id(&self, id: &str) -> Result<Option<Barber>, BookingError> {
        let conn = db::lock(&self.db);
        Ok(queries::get_barber(&conn, id)?)
    }
}
