//! Wire contract for the remote key source.
//!
//! The contract is a single unary method with two messages, so the prost
//! types and the client are maintained by hand against
//! `proto/keysource/v1/keysource.proto` instead of being generated at build
//! time; this keeps protoc out of the build.

mod keysource;

pub mod v1 {
    pub use crate::keysource::v1::*;
}
