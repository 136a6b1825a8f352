use std::sync::Arc;

use crate::config::AppConfig;
use crate::storage::{LeagueStore, StorageConfig};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LeagueStore>,
    pub config: Arc<AppConfig>,
    /// Held by mutating handlers across their read-modify-write cycle.
    pub write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = LeagueStore::new(StorageConfig::new(config.data_dir.clone()));
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}
