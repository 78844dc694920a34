pub mod availability;
pub mod catalog;
pub mod clock;
pub mod lifecycle;
pub mod retry;
pub mod scheduling;
