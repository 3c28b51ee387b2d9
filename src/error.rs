// ABOUTME: Defines all error types for the sluice library using thiserror.
// ABOUTME: Each subsystem has its own error enum, unified under SluiceError.

use crate::call::CallError;

/// Top-level error type for the sluice library.
#[derive(Debug, thiserror::Error)]
pub enum SluiceError {
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors surfaced to callers of `Dispatcher::enqueue`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Every attempt hit the provider's rate limit. Callers should treat
    /// this as "try again shortly" rather than a hard failure.
    #[error("'{operation}' abandoned after {attempts} rate-limited attempts")]
    RetriesExhausted { operation: String, attempts: u32 },

    /// The work itself failed with a non-rate-limit error. Single attempt,
    /// the underlying error is passed through unchanged.
    #[error("'{operation}' failed: {source}")]
    Task {
        operation: String,
        #[source]
        source: CallError,
    },

    /// The scheduler dropped the task's result channel. Only reachable if
    /// the dispatcher is torn down with tasks still queued.
    #[error("dispatcher stopped before '{operation}' completed")]
    Disconnected { operation: String },
}

/// Errors from lock acquisition.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The retry budget ran out while another holder kept the key.
    /// Retryable by the caller; the protected operation was never run.
    #[error("timed out acquiring lock '{key}' after {attempts} attempts")]
    Timeout { key: String, attempts: u32 },
}

/// Errors from the shared lock store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}
