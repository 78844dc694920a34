use std::env;
use std::time::Duration;

use crate::services::retry::RetryPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub cors_origin: String,
    pub busy_timeout: Duration,
    pub booking_max_attempts: usize,
    pub booking_retry_delay: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("PORT").unwrap_or(3000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "barbershop.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:4200".to_string()),
            busy_timeout: Duration::from_millis(parse_var("DB_BUSY_TIMEOUT_MS").unwrap_or(5000)),
            booking_max_attempts: parse_var("BOOKING_MAX_ATTEMPTS").unwrap_or(5),
            booking_retry_delay: Duration::from_millis(
                parse_var("BOOKING_RETRY_DELAY_MS").unwrap_or(20),
            ),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.booking_max_attempts.max(1),
            initial_delay: self.booking_retry_delay,
            ..RetryPolicy::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
