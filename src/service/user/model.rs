use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::types::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub telegram_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Username first, then first name, then a fixed placeholder.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.first_name.as_deref())
            .unwrap_or("anonymous")
    }
}
