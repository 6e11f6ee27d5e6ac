use std::path::PathBuf;
use std::sync::OnceLock;

use teloxide::types::UserId;

use crate::error::{BotError, BotResult};

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// One round lasts this long. Fixed by the game rules, not configurable.
pub const GAME_DURATION_SECONDS: u64 = 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub admin: AdminConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn set_global(config: AppConfig) -> BotResult<()> {
        APP_CONFIG
            .set(config)
            .map_err(|_| BotError::AppStateError("Failed to set global app config".to_string()))
    }

    pub fn get() -> BotResult<&'static AppConfig> {
        APP_CONFIG
            .get()
            .ok_or_else(|| BotError::AppStateError("App config not initialized".to_string()))
    }

    #[cfg(test)]
    pub fn new_test_config() -> AppConfig {
        AppConfig {
            telegram: TelegramConfig("123456:TEST".to_string()),
            admin: AdminConfig {
                telegram_user_id: UserId(1),
            },
            storage: StorageConfig {
                data_path: PathBuf::from("test-data.json"),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct TelegramConfig(pub String);

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub telegram_user_id: UserId,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub data_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for environment variable {0}")]
    InvalidEnv(&'static str),
}

pub fn build_config() -> Result<AppConfig, ConfigError> {
    info!("Building AppConfig...");

    let token = std::env::var("TG_TOKEN").map_err(|_| ConfigError::MissingEnv("TG_TOKEN"))?;

    let admin_id = std::env::var("ADMIN_ID")
        .map_err(|_| ConfigError::MissingEnv("ADMIN_ID"))?
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidEnv("ADMIN_ID"))?;

    let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| "data.json".to_string());

    Ok(AppConfig {
        telegram: TelegramConfig(token),
        admin: AdminConfig {
            telegram_user_id: UserId(admin_id),
        },
        storage: StorageConfig {
            data_path: PathBuf::from(data_path),
        },
    })
}
