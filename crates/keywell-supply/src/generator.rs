use crate::buffer::KeyBuffer;
use crate::config::SupplyConfig;
use crate::error::{KeyGenError, SupplyError};
use crate::fetcher::BatchFetcher;
use crate::refill::RefillController;
use async_trait::async_trait;
use keywell_core::{Key, KeySource};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::trace;

/// Consumer seam for minting keys.
///
/// The URL-creation use case depends on this trait rather than the concrete
/// supply, so tests can substitute a canned issuer.
#[async_trait]
pub trait KeyIssuer: Send + Sync + 'static {
    /// Returns the next reserved key.
    ///
    /// Fails with [`KeyGenError::TemporarilyUnavailable`] when no key can be
    /// produced within the configured wait bound; callers should treat that
    /// as a retryable failure, not a fatal one.
    async fn next_key(&self) -> Result<Key, KeyGenError>;
}

/// Consumer-facing façade over the key supply.
///
/// `next_key` pops from the local buffer and never waits on the network
/// while the buffer holds keys; a fetch only runs in the background, or
/// while a caller rides out an empty buffer within the wait bound. Cloning
/// is cheap and clones share the same buffer and refill controller, so the
/// façade can be handed to arbitrarily many request-handling tasks.
#[derive(Debug)]
pub struct KeyGenerator<S> {
    buffer: Arc<KeyBuffer>,
    refill: Arc<RefillController<S>>,
    wait_timeout: Duration,
}

impl<S> Clone for KeyGenerator<S> {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            refill: Arc::clone(&self.refill),
            wait_timeout: self.wait_timeout,
        }
    }
}

impl<S: KeySource> KeyGenerator<S> {
    /// Builds the supply around a key source. Fails on unserviceable
    /// sizing; see [`SupplyConfig::validate`].
    pub fn new(source: S, config: SupplyConfig) -> Result<Self, SupplyError> {
        config.validate()?;
        let buffer = Arc::new(KeyBuffer::new(config.capacity));
        let fetcher = BatchFetcher::new(source, config.retry.clone(), config.min_batch_size);
        let refill = RefillController::new(
            Arc::clone(&buffer),
            fetcher,
            config.low_water_mark,
            config.batch_size,
        );
        Ok(Self {
            buffer,
            refill,
            wait_timeout: config.wait_timeout,
        })
    }

    /// Eagerly fills the empty buffer. Call once at startup before serving
    /// consumers; the façade is not considered ready until this succeeds.
    pub async fn prime(&self) -> Result<usize, SupplyError> {
        Ok(self.refill.refill_now().await?)
    }

    /// Buffered keys not yet issued.
    pub fn occupancy(&self) -> usize {
        self.buffer.occupancy()
    }

    /// Returns the next reserved key; see [`KeyIssuer::next_key`].
    pub async fn next_key(&self) -> Result<Key, KeyGenError> {
        if let Some(key) = self.buffer.try_take() {
            self.refill.maybe_trigger_refill();
            return Ok(key);
        }

        // Empty: make sure a refill is running, then ride it out up to the
        // wait bound, re-checking on every wake since another consumer may
        // win the race for a fresh key.
        self.refill.maybe_trigger_refill();
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            let mut notified = pin!(self.buffer.notified());
            // Arm the waker before the re-check so a put landing in between
            // is not missed.
            notified.as_mut().enable();
            if let Some(key) = self.buffer.try_take() {
                self.refill.maybe_trigger_refill();
                return Ok(key);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(KeyGenError::TemporarilyUnavailable);
            }
            if time::timeout(deadline - now, notified).await.is_err() {
                trace!("wait bound elapsed with the buffer still empty");
                return Err(KeyGenError::TemporarilyUnavailable);
            }
        }
    }
}

#[async_trait]
impl<S: KeySource> KeyIssuer for KeyGenerator<S> {
    async fn next_key(&self) -> Result<Key, KeyGenError> {
        KeyGenerator::next_key(self).await
    }
}
