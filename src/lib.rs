use std::sync::Arc;

use config::Config;
use database::UserStore;
use queries::UserReadModel;

pub mod cache;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod infrastructure;
pub mod middleware;
pub mod models;
pub mod queries;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn UserStore>,
    pub read_model: Arc<UserReadModel>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn UserStore>, read_model: UserReadModel) -> Self {
        Self {
            config: Arc::new(config),
            store,
            read_model: Arc::new(read_model),
        }
    }
}
