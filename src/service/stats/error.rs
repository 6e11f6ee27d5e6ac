use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
