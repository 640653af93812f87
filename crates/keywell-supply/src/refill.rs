use crate::buffer::KeyBuffer;
use crate::error::FetchError;
use crate::fetcher::BatchFetcher;
use keywell_core::KeySource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Decides when to refill the buffer and guarantees at most one refill in
/// flight.
///
/// The in-flight latch is claimed with a compare-and-set, so a burst of
/// triggers from concurrent consumers coalesces into a single fetch. The
/// latch is released through an RAII guard, unconditionally on success,
/// exhausted retries, or task cancellation.
#[derive(Debug)]
pub struct RefillController<S> {
    /// Handle to self for spawning the background refill task; the
    /// controller always lives behind the `Arc` created in [`new`](Self::new).
    weak: Weak<Self>,
    buffer: Arc<KeyBuffer>,
    fetcher: BatchFetcher<S>,
    low_water_mark: usize,
    batch_size: usize,
    in_flight: AtomicBool,
}

impl<S: KeySource> RefillController<S> {
    pub fn new(
        buffer: Arc<KeyBuffer>,
        fetcher: BatchFetcher<S>,
        low_water_mark: usize,
        batch_size: usize,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            buffer,
            fetcher,
            low_water_mark,
            batch_size,
            in_flight: AtomicBool::new(false),
        })
    }

    /// Starts a background refill when the buffer sits at or below the
    /// low-water mark and none is already running. Always returns
    /// immediately; extra calls while a refill is in flight are no-ops,
    /// never queued duplicates.
    pub fn maybe_trigger_refill(&self) {
        if self.buffer.occupancy() > self.low_water_mark {
            return;
        }
        if !self.try_claim() {
            return;
        }
        match self.weak.upgrade() {
            Some(controller) => {
                tokio::spawn(async move {
                    controller.run_claimed().await;
                });
            }
            // Only reachable mid-teardown, when skipping the refill is
            // right; the claimed latch still has to be handed back.
            None => self.in_flight.store(false, Ordering::Release),
        }
    }

    /// Runs one refill inline, honoring the same latch as the background
    /// path. Used to prime the buffer before the façade is handed out.
    ///
    /// Returns the number of keys added, or zero when a refill was already
    /// in flight.
    pub async fn refill_now(&self) -> Result<usize, FetchError> {
        if !self.try_claim() {
            return Ok(0);
        }
        let _latch = LatchGuard(&self.in_flight);
        self.fetch_and_store().await
    }

    /// Body of the background refill; expects the latch to be claimed.
    async fn run_claimed(&self) {
        let _latch = LatchGuard(&self.in_flight);
        if let Err(error) = self.fetch_and_store().await {
            warn!(error = %error, "refill failed; a future low-water trigger will retry");
        }
    }

    async fn fetch_and_store(&self) -> Result<usize, FetchError> {
        let batch = self.fetcher.fetch_batch(self.batch_size).await?;
        let fetched = batch.len();
        let added = self.buffer.put(batch);
        if added < fetched {
            // Over-fetch past the capacity ceiling wastes reserved keys;
            // accepted, but worth seeing in the logs.
            debug!(
                discarded = fetched - added,
                "buffer at capacity, discarded over-fetched keys"
            );
        }
        debug!(added, occupancy = self.buffer.occupancy(), "refill complete");
        Ok(added)
    }

    fn try_claim(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Releases the in-flight latch when the refill terminates, however it
/// terminates.
struct LatchGuard<'a>(&'a AtomicBool);

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use async_trait::async_trait;
    use keywell_core::{Key, SourceError};
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    /// Counts fetch invocations; optionally delays each response. The call
    /// counter is shared so tests keep a handle after the source moves into
    /// the fetcher.
    struct CountingSource {
        calls: Arc<AtomicU32>,
        delay: Duration,
        fail: bool,
    }

    impl CountingSource {
        fn healthy(delay: Duration) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    delay,
                    fail: false,
                },
                calls,
            )
        }

        fn failing() -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    delay: Duration::ZERO,
                    fail: true,
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl KeySource for CountingSource {
        async fn fetch_keys(&self, max_keys: usize) -> Result<Vec<Key>, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(SourceError::Unreachable("down".to_string()));
            }
            Ok((0..max_keys)
                .map(|i| Key::new_unchecked(format!("c{call}-{i}")))
                .collect())
        }
    }

    fn controller(
        source: CountingSource,
        capacity: usize,
        low_water_mark: usize,
        batch_size: usize,
    ) -> Arc<RefillController<CountingSource>> {
        let retry = RetryConfig::builder()
            .attempt_timeout(Duration::from_secs(1))
            .max_attempts(1)
            .backoff_base(Duration::from_millis(1))
            .build();
        let buffer = Arc::new(KeyBuffer::new(capacity));
        RefillController::new(
            buffer,
            BatchFetcher::new(source, retry, 1),
            low_water_mark,
            batch_size,
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn trigger_burst_coalesces_into_one_fetch() {
        let (source, calls) = CountingSource::healthy(Duration::from_millis(50));
        let controller = controller(source, 100, 10, 50);

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    controller.maybe_trigger_refill();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.buffer.occupancy(), 50);
    }

    #[tokio::test]
    async fn trigger_above_low_water_is_a_noop() {
        let (source, calls) = CountingSource::healthy(Duration::ZERO);
        let controller = controller(source, 10, 2, 5);
        controller.buffer.put(
            (0..5)
                .map(|i| Key::new_unchecked(format!("seed{i}")))
                .collect(),
        );

        controller.maybe_trigger_refill();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refill_releases_the_latch() {
        let (source, calls) = CountingSource::failing();
        let controller = controller(source, 10, 3, 5);

        assert!(controller.refill_now().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The latch must be free again for the next attempt.
        assert!(controller.refill_now().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refill_now_while_busy_is_a_noop() {
        let (source, calls) = CountingSource::healthy(Duration::from_millis(100));
        let controller = controller(source, 10, 3, 5);

        let background = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refill_now().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let added = controller.refill_now().await.unwrap();
        assert_eq!(added, 0);

        assert_eq!(background.await.unwrap().unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refill_truncates_at_capacity() {
        let (source, _calls) = CountingSource::healthy(Duration::ZERO);
        let controller = controller(source, 3, 1, 10);

        let added = controller.refill_now().await.unwrap();
        assert_eq!(added, 3);
        assert_eq!(controller.buffer.occupancy(), 3);
    }
}
