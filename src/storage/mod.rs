mod error;
mod json;
mod memory;

pub use error::StorageError;
pub use json::JsonStore;
pub use memory::MemoryStore;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::types::UserId;

use crate::service::game::GameResult;
use crate::service::user::UserProfile;

/// Narrow repository interface over user profiles and finished games.
/// Game results are append-only; profiles are created once and never
/// rewritten by later calls.
#[async_trait]
pub trait GameStore: Send + Sync + 'static {
    async fn get_or_create_user(
        &self,
        telegram_id: UserId,
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<UserProfile, StorageError>;

    async fn save_game_result(&self, result: &GameResult) -> Result<(), StorageError>;

    async fn get_all_game_results(&self) -> Result<Vec<GameResult>, StorageError>;

    async fn get_all_users(&self) -> Result<Vec<UserProfile>, StorageError>;
}

#[derive(Clone)]
pub struct StorageManager {
    store: Arc<dyn GameStore>,
}

impl StorageManager {
    pub async fn json(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let store = JsonStore::open(path).await?;
        Ok(Self { store: Arc::new(store) })
    }

    pub fn memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub async fn get_or_create_user(
        &self,
        telegram_id: UserId,
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<UserProfile, StorageError> {
        self.store
            .get_or_create_user(telegram_id, username, first_name, last_name)
            .await
    }

    pub async fn save_game_result(&self, result: &GameResult) -> Result<(), StorageError> {
        self.store.save_game_result(result).await
    }

    pub async fn get_all_game_results(&self) -> Result<Vec<GameResult>, StorageError> {
        self.store.get_all_game_results().await
    }

    pub async fn get_all_users(&self) -> Result<Vec<UserProfile>, StorageError> {
        self.store.get_all_users().await
    }
}
