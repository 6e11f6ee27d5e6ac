use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("user already has an active game")]
    SessionAlreadyActive,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
