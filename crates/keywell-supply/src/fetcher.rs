use crate::config::RetryConfig;
use crate::error::FetchError;
use keywell_core::{Key, KeySource, SourceError};
use std::collections::HashSet;
use tokio::time;
use tracing::{debug, warn};

/// Fetch-and-validate stage in front of a [`KeySource`].
///
/// Owns the timeout, retry, and failure classification for a single batch
/// fetch. Never touches the buffer; the refill controller is the sole
/// mutator of buffer state.
#[derive(Debug)]
pub struct BatchFetcher<S> {
    source: S,
    retry: RetryConfig,
    min_batch_size: usize,
}

impl<S: KeySource> BatchFetcher<S> {
    pub fn new(source: S, retry: RetryConfig, min_batch_size: usize) -> Self {
        Self {
            source,
            retry,
            min_batch_size,
        }
    }

    /// Fetches one batch of up to `desired` keys.
    ///
    /// Transient failures are retried with exponential backoff up to the
    /// configured attempt budget. A malformed batch is salvaged where
    /// possible and only rejected when fewer than the minimum acceptable
    /// keys survive validation; a `Malformed` error from the source itself
    /// ends the fetch without further retries.
    pub async fn fetch_batch(&self, desired: usize) -> Result<Vec<Key>, FetchError> {
        let mut backoff = self.retry.backoff_base;
        let mut last_transient = FetchError::Timeout { attempts: 0 };

        for attempt in 1..=self.retry.max_attempts {
            match time::timeout(self.retry.attempt_timeout, self.source.fetch_keys(desired)).await
            {
                Ok(Ok(batch)) => return self.validate(batch, desired),
                Ok(Err(SourceError::Malformed(message))) => {
                    return Err(FetchError::Malformed(message));
                }
                Ok(Err(SourceError::Timeout)) | Err(_) => {
                    debug!(attempt, "key source attempt timed out");
                    last_transient = FetchError::Timeout { attempts: attempt };
                }
                Ok(Err(SourceError::Unreachable(message))) => {
                    debug!(attempt, error = %message, "key source unreachable");
                    last_transient = FetchError::Unreachable {
                        attempts: attempt,
                        message,
                    };
                }
            }
            if attempt < self.retry.max_attempts {
                time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
            }
        }
        Err(last_transient)
    }

    /// Drops empty keys and intra-batch duplicates. Either anomaly means
    /// the remote bent its uniqueness contract, so each one is surfaced
    /// rather than silently issued.
    fn validate(&self, batch: Vec<Key>, desired: usize) -> Result<Vec<Key>, FetchError> {
        let mut seen = HashSet::with_capacity(batch.len());
        let mut valid = Vec::with_capacity(batch.len());
        let mut dropped = 0usize;

        for key in batch {
            if key.as_str().is_empty() {
                warn!("key source returned an empty key; dropping it");
                dropped += 1;
            } else if !seen.insert(key.clone()) {
                warn!(key = %key, "key source returned a duplicate key in one batch; dropping it");
                dropped += 1;
            } else {
                valid.push(key);
            }
        }

        if valid.len() < self.min_batch_size {
            if dropped > 0 {
                return Err(FetchError::Malformed(format!(
                    "only {} of {} keys survived validation",
                    valid.len(),
                    valid.len() + dropped
                )));
            }
            return Err(FetchError::Exhausted {
                wanted: self.min_batch_size,
                got: valid.len(),
            });
        }

        debug!(fetched = valid.len(), desired, dropped, "fetched key batch");
        Ok(valid)
    }
}
