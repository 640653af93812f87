use thiserror::Error;

/// Terminal outcome of one batch fetch, retries included.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("key source timed out after {attempts} attempts")]
    Timeout { attempts: u32 },
    #[error("key source unreachable after {attempts} attempts: {message}")]
    Unreachable { attempts: u32, message: String },
    #[error("key source returned a malformed batch: {0}")]
    Malformed(String),
    #[error("key source returned too few keys: wanted at least {wanted}, got {got}")]
    Exhausted { wanted: usize, got: usize },
}

/// The only failure consumers of the façade ever observe.
///
/// Fetch and refill failures below the façade are absorbed into this single
/// condition; callers treat it as a retryable failure of the shortening
/// request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyGenError {
    #[error("no key available within the wait bound")]
    TemporarilyUnavailable,
}

/// Failures surfaced when constructing or priming the supply.
#[derive(Debug, Clone, Error)]
pub enum SupplyError {
    #[error("invalid supply configuration: {0}")]
    InvalidConfig(String),
    #[error("refill failed: {0}")]
    Fetch(#[from] FetchError),
}
