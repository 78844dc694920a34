use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Barber {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    pub active: bool,
    /// Recorded for the back office; never used to compute anything here.
    pub commission_percentage: f64,
    pub created_at: NaiveDateTime,
}
