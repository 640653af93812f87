use async_trait::async_trait;
use keywell_core::{Key, KeySource, SourceError};
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-memory [`KeySource`] issuing sequential keys from a prefix.
///
/// Every key is unique within a single source instance. For multi-node
/// runs each node needs its own prefix, the same way a counter-partitioned
/// authority hands out disjoint ranges.
#[derive(Debug)]
pub struct InMemoryKeySource {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for InMemoryKeySource {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl InMemoryKeySource {
    /// Creates a source with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a source starting from a specific counter value.
    ///
    /// Useful for distributing counter ranges across nodes (e.g. node 1
    /// starts at 0, node 2 at 1_000_000).
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl KeySource for InMemoryKeySource {
    async fn fetch_keys(&self, max_keys: usize) -> Result<Vec<Key>, SourceError> {
        let start = self.counter.fetch_add(max_keys as u64, Ordering::SeqCst);
        Ok((0..max_keys as u64)
            .map(|i| Key::new_unchecked(format!("{}{:06}", self.prefix, start + i)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn batches_are_sequential() {
        let source = InMemoryKeySource::with_prefix("kw");

        let batch = source.fetch_keys(3).await.unwrap();
        let tokens: Vec<&str> = batch.iter().map(Key::as_str).collect();
        assert_eq!(tokens, vec!["kw000000", "kw000001", "kw000002"]);
    }

    #[tokio::test]
    async fn consecutive_batches_never_overlap() {
        let source = InMemoryKeySource::with_prefix("kw");

        let mut seen = HashSet::new();
        for _ in 0..4 {
            for key in source.fetch_keys(10).await.unwrap() {
                assert!(seen.insert(key));
            }
        }
        assert_eq!(seen.len(), 40);
    }

    #[tokio::test]
    async fn offset_shifts_the_counter() {
        let source = InMemoryKeySource::with_offset("node-b", 1000);

        let batch = source.fetch_keys(1).await.unwrap();
        assert_eq!(batch[0].as_str(), "node-b001000");
    }

    #[test]
    fn source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InMemoryKeySource>();
    }
}
