pub mod appointment;
pub mod barber;
pub mod service;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, Slot};
pub use barber::Barber;
pub use service::{Service, ServiceCategory};
pub use user::{Role, User};
