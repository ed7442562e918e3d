use thiserror::Error;

/// Error delivered to a loader's callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError<E> {
    /// The batch function failed for the whole batch.
    #[error("batch function failed: {0}")]
    BatchFn(E),

    /// The batch function did not return one value per key.
    #[error("batch function returned {value_count} values for {key_count} keys")]
    UnequalKeyValueSize { key_count: usize, value_count: usize },

    /// The owning request was cancelled before the batch resolved.
    #[error("load cancelled")]
    Cancelled,
}

/// Failure of a bulk query against the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// The query was rejected or failed while running.
    #[error("query failed: {message}")]
    Query { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
