use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("key must not be empty")]
    EmptyKey,
}

/// Errors reported by a single call to a key source.
///
/// The split matters to the retry layer: `Timeout` and `Unreachable` are
/// transient and retried within a budget, `Malformed` is not.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("key source timed out")]
    Timeout,
    #[error("key source unreachable: {0}")]
    Unreachable(String),
    #[error("key source returned a malformed response: {0}")]
    Malformed(String),
}
