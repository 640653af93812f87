use crate::error::SourceError;
use crate::key::Key;
use async_trait::async_trait;

/// The fetch-a-batch contract of the remote key source.
///
/// Implementations own the transport. The authority behind this trait
/// guarantees global uniqueness of every key it ever returns and never
/// reissues one, so callers never verify keys against storage; they only
/// validate batch shape.
#[async_trait]
pub trait KeySource: Send + Sync + 'static {
    /// Fetches up to `max_keys` freshly reserved keys.
    ///
    /// A shorter-than-requested batch is not an error at this layer;
    /// minimum acceptable counts are enforced by the caller.
    async fn fetch_keys(&self, max_keys: usize) -> Result<Vec<Key>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedSource(Vec<&'static str>);

    #[async_trait]
    impl KeySource for CannedSource {
        async fn fetch_keys(&self, max_keys: usize) -> Result<Vec<Key>, SourceError> {
            Ok(self
                .0
                .iter()
                .take(max_keys)
                .map(|token| Key::new_unchecked(*token))
                .collect())
        }
    }

    #[tokio::test]
    async fn source_caps_batch_at_requested_count() {
        let source = CannedSource(vec!["a", "b", "c"]);
        let keys = source.fetch_keys(2).await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn source_is_object_safe() {
        fn assert_dyn(_: &dyn KeySource) {}
        let source = CannedSource(vec![]);
        assert_dyn(&source);
    }
}
