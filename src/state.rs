use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Db;
use crate::services::clock::Clock;
use crate::services::scheduling::Scheduler;

pub struct AppState {
    /// Catalog reads and writes go straight to the store; appointments go
    /// through `scheduler`.
    pub db: Db,
    pub config: AppConfig,
    pub clock: Arc<dyn Clock>,
    pub scheduler: Scheduler,
}

impl AppState {
    pub fn new(db: Db, config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let scheduler = Scheduler::new(Arc::clone(&db), Arc::clone(&clock), config.retry_policy());
        Self {
            db,
            config,
            clock,
            scheduler,
        }
    }
}
