//! Hand-maintained mirror of `proto/keysource/v1/keysource.proto`.
//!
//! Keep the message tags in sync with the proto file; the proto file is the
//! source of truth shared with the authority's own build.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

/// Request for a batch of reserved keys.
#[derive(Clone, PartialEq, prost::Message)]
pub struct FetchKeysRequest {
    /// Maximum number of keys the caller wants in this batch. The source
    /// may return fewer.
    #[prost(uint32, tag = "1")]
    pub max_key_count: u32,
}

/// A batch of freshly reserved keys, in issue order.
#[derive(Clone, PartialEq, prost::Message)]
pub struct FetchKeysResponse {
    #[prost(string, repeated, tag = "1")]
    pub keys: Vec<String>,
}

/// Thin unary client for the `keysource.v1.KeySource` service.
///
/// Deadlines and retries are the caller's concern; this type only knows how
/// to put one request on the wire.
#[derive(Debug, Clone)]
pub struct KeySourceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl KeySourceClient {
    /// Wraps an established (possibly lazy) channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Calls `KeySource/FetchKeys` once.
    pub async fn fetch_keys(
        &mut self,
        request: FetchKeysRequest,
    ) -> Result<FetchKeysResponse, tonic::Status> {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::unavailable(format!("key source channel not ready: {e}"))
        })?;
        let codec = tonic_prost::ProstCodec::default();
        let path = PathAndQuery::from_static("/keysource.v1.KeySource/FetchKeys");
        self.inner
            .unary(tonic::Request::new(request), path, codec)
            .await
            .map(tonic::Response::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn request_roundtrips_on_the_wire() {
        let request = FetchKeysRequest { max_key_count: 128 };
        let bytes = request.encode_to_vec();
        let decoded = FetchKeysRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn response_roundtrips_on_the_wire() {
        let response = FetchKeysResponse {
            keys: vec!["3mJr7A".to_string(), "9xQz1B".to_string()],
        };
        let bytes = response.encode_to_vec();
        let decoded = FetchKeysResponse::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.keys, response.keys);
    }

    #[test]
    fn empty_response_decodes_to_no_keys() {
        let decoded = FetchKeysResponse::decode(&[][..]).unwrap();
        assert!(decoded.keys.is_empty());
    }
}
