use std::sync::OnceLock;

use crate::config::AppConfig;
use crate::error::{BotError, BotResult};
use crate::service::ServiceRegistry;
use crate::storage::StorageManager;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: StorageManager,
    pub service: ServiceRegistry,
}

static APP_STATE: OnceLock<AppState> = OnceLock::new();

impl AppState {
    pub async fn new(config: &AppConfig) -> BotResult<Self> {
        let storage = StorageManager::json(&config.storage.data_path).await?;
        let service = ServiceRegistry::new(storage.clone());

        Ok(Self {
            config: config.clone(),
            storage,
            service,
        })
    }

    pub fn set_global(state: AppState) -> BotResult<()> {
        APP_STATE
            .set(state)
            .map_err(|_| BotError::AppStateError("Failed to set global app state".into()))
    }

    pub fn get() -> BotResult<AppState> {
        APP_STATE
            .get()
            .cloned()
            .ok_or_else(|| BotError::AppStateError("App state not initialized".into()))
    }

    /// Builds a state over in-memory storage and installs it as the global
    /// if none is set yet. Tests share one process, so this is idempotent.
    #[cfg(test)]
    pub fn init_test() -> AppState {
        if let Ok(state) = AppState::get() {
            return state;
        }

        let config = AppConfig::new_test_config();
        let storage = StorageManager::memory();
        let service = ServiceRegistry::new(storage.clone());
        let state = AppState {
            config,
            storage,
            service,
        };
        let _ = APP_STATE.set(state);

        AppState::get().expect("test app state")
    }
}
