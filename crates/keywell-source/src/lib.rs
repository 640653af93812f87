//! Key source transports.
//!
//! Implementations of the [`keywell_core::KeySource`] contract: a
//! gRPC-backed source talking to the remote key-generation authority, and
//! an in-memory source for local runs and tests.

pub mod grpc;
pub mod memory;

pub use grpc::GrpcKeySource;
pub use memory::InMemoryKeySource;
