use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use teloxide::types::UserId;
use tokio::sync::Mutex;

use crate::service::game::GameResult;
use crate::service::user::UserProfile;

use super::{GameStore, StorageError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct DataFile {
    users: Vec<UserProfile>,
    game_results: Vec<GameResult>,
}

/// Single-document store backed by one JSON file. The whole document is
/// held in memory behind a mutex and rewritten after every mutation.
pub struct JsonStore {
    path: PathBuf,
    data: Mutex<DataFile>,
}

impl JsonStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("data file {} not found, starting empty", path.display());
                DataFile::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    async fn persist(&self, data: &DataFile) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl GameStore for JsonStore {
    async fn get_or_create_user(
        &self,
        telegram_id: UserId,
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<UserProfile, StorageError> {
        let mut data = self.data.lock().await;

        if let Some(user) = data.users.iter().find(|u| u.telegram_id == telegram_id) {
            return Ok(user.clone());
        }

        let user = UserProfile {
            telegram_id,
            username,
            first_name,
            last_name,
            created_at: Utc::now(),
        };

        data.users.push(user.clone());
        self.persist(&data).await?;

        info!("created user profile for {}", telegram_id);

        Ok(user)
    }

    async fn save_game_result(&self, result: &GameResult) -> Result<(), StorageError> {
        let mut data = self.data.lock().await;
        data.game_results.push(result.clone());
        self.persist(&data).await
    }

    async fn get_all_game_results(&self) -> Result<Vec<GameResult>, StorageError> {
        Ok(self.data.lock().await.game_results.clone())
    }

    async fn get_all_users(&self) -> Result<Vec<UserProfile>, StorageError> {
        Ok(self.data.lock().await.users.clone())
    }
}
