use std::fmt::Debug;

use time::OffsetDateTime;

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::{MemoryStore, DEFAULT_CLEANUP_INTERVAL};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Persistence backend for encoded session payloads.
///
/// Implementations must be safe to call concurrently. Calls on the same
/// token are expected to be serializable, with the last `commit` or `delete`
/// winning.
#[async_trait::async_trait]
pub trait Store: Send + Sync + Debug + 'static {
    /// Returns the payload stored under `token`, or `None` when it is absent
    /// or its expiry has passed.
    async fn find(&self, token: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Inserts or overwrites the payload under `token`, valid until `expiry`.
    async fn commit(&self, token: &str, payload: Vec<u8>, expiry: OffsetDateTime)
        -> StoreResult<()>;

    /// Removes `token`; deleting a missing token is not an error.
    async fn delete(&self, token: &str) -> StoreResult<()>;
}
