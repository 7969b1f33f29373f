use std::sync::Arc;

use crate::config::Config;
use crate::database::Database;
use crate::services::Notifier;

pub mod auth;
pub mod exports;
pub mod health;
pub mod lots;
pub mod reservations;
pub mod statistics;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: Config,
    pub notifier: Arc<Notifier>,
}
