use async_trait::async_trait;
use chrono::Utc;
use teloxide::types::UserId;
use tokio::sync::Mutex;

use crate::service::game::GameResult;
use crate::service::user::UserProfile;

use super::{GameStore, StorageError};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserProfile>,
    game_results: Vec<GameResult>,
}

/// In-memory store with the same semantics as [`super::JsonStore`], minus
/// the file. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn get_or_create_user(
        &self,
        telegram_id: UserId,
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<UserProfile, StorageError> {
        let mut tables = self.tables.lock().await;

        if let Some(user) = tables.users.iter().find(|u| u.telegram_id == telegram_id) {
            return Ok(user.clone());
        }

        let user = UserProfile {
            telegram_id,
            username,
            first_name,
            last_name,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn save_game_result(&self, result: &GameResult) -> Result<(), StorageError> {
        self.tables.lock().await.game_results.push(result.clone());
        Ok(())
    }

    async fn get_all_game_results(&self) -> Result<Vec<GameResult>, StorageError> {
        Ok(self.tables.lock().await.game_results.clone())
    }

    async fn get_all_users(&self) -> Result<Vec<UserProfile>, StorageError> {
        Ok(self.tables.lock().await.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_profile_keeps_original_names() {
        let store = MemoryStore::new();

        store
            .get_or_create_user(UserId(1), None, Some("X".into()), None)
            .await
            .unwrap();
        let again = store
            .get_or_create_user(UserId(1), Some("renamed".into()), Some("Y".into()), None)
            .await
            .unwrap();

        assert_eq!(again.username, None);
        assert_eq!(again.first_name.as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn test_results_are_append_only() {
        let store = MemoryStore::new();
        let result = GameResult::new(UserId(2), Utc::now());

        store.save_game_result(&result).await.unwrap();
        store.save_game_result(&result).await.unwrap();

        assert_eq!(store.get_all_game_results().await.unwrap().len(), 2);
    }
}
