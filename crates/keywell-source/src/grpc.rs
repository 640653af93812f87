use async_trait::async_trait;
use keywell_core::{Key, KeySource, SourceError};
use keywell_proto_schema::v1::{FetchKeysRequest, KeySourceClient};
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::trace;

/// A gRPC-backed [`KeySource`].
///
/// Holds a multiplexed channel to the remote authority; each fetch clones
/// the underlying client, so the source is cheap to share.
#[derive(Debug, Clone)]
pub struct GrpcKeySource {
    client: KeySourceClient,
}

impl GrpcKeySource {
    /// Connects lazily to the given endpoint (e.g. `http://keysource:50051`).
    ///
    /// The channel is established on first use, so construction never
    /// touches the network.
    pub fn connect(endpoint: impl Into<String>) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(endpoint.into())?.connect_lazy();
        Ok(Self::from_channel(channel))
    }

    /// Wraps an already-configured channel.
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            client: KeySourceClient::new(channel),
        }
    }
}

#[async_trait]
impl KeySource for GrpcKeySource {
    async fn fetch_keys(&self, max_keys: usize) -> Result<Vec<Key>, SourceError> {
        let request = FetchKeysRequest {
            max_key_count: u32::try_from(max_keys).unwrap_or(u32::MAX),
        };
        trace!(max_keys, "requesting key batch from remote source");

        let mut client = self.client.clone();
        let response = client.fetch_keys(request).await.map_err(classify_status)?;

        // The fetch layer validates batch shape (empty keys, duplicates);
        // the transport hands the tokens through untouched.
        Ok(response.keys.into_iter().map(Key::new_unchecked).collect())
    }
}

/// Maps a gRPC status onto the transient/permanent split the fetch layer
/// retries on.
fn classify_status(status: Status) -> SourceError {
    match status.code() {
        Code::DeadlineExceeded | Code::Cancelled => SourceError::Timeout,
        Code::Unavailable | Code::Unknown | Code::Aborted | Code::ResourceExhausted => {
            SourceError::Unreachable(status.message().to_string())
        }
        code => SourceError::Malformed(format!("{}: {}", code, status.message())),
    }
}
