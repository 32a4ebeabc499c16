// [libs/infra/data-store/src/errors.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataStoreError {
    #[error("wrapped data store write failed: {0}")]
    WriteFailed(String),

    #[error("data store has not completed Init yet")]
    NotInitialized,

    #[error("data store is closed")]
    Closed,
}
