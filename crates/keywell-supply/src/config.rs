use crate::error::SupplyError;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Retry policy for a single batch fetch.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RetryConfig {
    /// Deadline applied to each individual attempt.
    #[builder(default = Duration::from_secs(1))]
    pub attempt_timeout: Duration,
    /// Total attempts per fetch, first try included.
    #[builder(default = 3)]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    #[builder(default = Duration::from_millis(100))]
    pub backoff_base: Duration,
}

/// Sizing and timing of the key supply.
///
/// Sizing is a capacity-planning contract: a refill must complete faster
/// than consumers drain the keys above the low-water mark at the expected
/// request rate. The operator sizes `capacity`, `low_water_mark`, and
/// `batch_size` against throughput and the key source's typical latency;
/// nothing here auto-tunes, so the sizing fields carry no defaults.
#[derive(Debug, Clone, TypedBuilder)]
pub struct SupplyConfig {
    /// Hard ceiling on buffered keys.
    pub capacity: usize,
    /// Occupancy at or below which a refill is triggered.
    pub low_water_mark: usize,
    /// Keys requested per refill.
    pub batch_size: usize,
    /// Fewest valid keys an acceptable batch may carry.
    #[builder(default = 1)]
    pub min_batch_size: usize,
    /// Longest a consumer waits on an empty buffer before failing.
    #[builder(default = Duration::from_millis(500))]
    pub wait_timeout: Duration,
    /// Retry policy for each refill's fetch.
    #[builder(default = RetryConfig::builder().build())]
    pub retry: RetryConfig,
}

impl SupplyConfig {
    /// Rejects sizings that can never keep the buffer serviceable.
    pub fn validate(&self) -> Result<(), SupplyError> {
        if self.capacity == 0 {
            return Err(SupplyError::InvalidConfig(
                "capacity must be non-zero".to_string(),
            ));
        }
        if self.low_water_mark >= self.capacity {
            return Err(SupplyError::InvalidConfig(format!(
                "low-water mark ({}) must be below capacity ({})",
                self.low_water_mark, self.capacity
            )));
        }
        if self.batch_size == 0 {
            return Err(SupplyError::InvalidConfig(
                "batch size must be non-zero".to_string(),
            ));
        }
        if self.min_batch_size == 0 || self.min_batch_size > self.batch_size {
            return Err(SupplyError::InvalidConfig(format!(
                "minimum batch size ({}) must be between 1 and the batch size ({})",
                self.min_batch_size, self.batch_size
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(SupplyError::InvalidConfig(
                "retry attempts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
