//! Core types and traits for the Keywell key supply client.
//!
//! This crate provides the shared types used by the key source
//! transports and the supply layer: the opaque [`Key`] token and the
//! [`KeySource`] fetch-a-batch contract.

pub mod error;
pub mod key;
pub mod source;

pub use error::{CoreError, SourceError};
pub use key::Key;
pub use source::KeySource;
