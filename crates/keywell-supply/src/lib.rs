//! The key supply client: a standing buffer of reserved short-alias keys.
//!
//! Minting a short alias needs a globally unique key. Reserving one from
//! the remote authority on every request would put a network round trip on
//! the hot path, so this crate keeps a local [`KeyBuffer`] of keys already
//! reserved in batches and serves them one at a time through the
//! [`KeyGenerator`] façade. A [`RefillController`] tops the buffer up in the
//! background before it runs dry, with at most one refill ever in flight.

pub mod buffer;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod refill;

pub use buffer::KeyBuffer;
pub use config::{RetryConfig, SupplyConfig};
pub use error::{FetchError, KeyGenError, SupplyError};
pub use fetcher::BatchFetcher;
pub use generator::{KeyGenerator, KeyIssuer};
pub use refill::RefillController;
