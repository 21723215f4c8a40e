//! Consensus-critical byte handling.
//!
//! Everything in this module operates on the exact bytes stored on disk.
//! The oracle never re-serializes a parsed structure to compute a hash;
//! instead the parser retains slices of the original payload (see
//! [`crate::transaction`]), so the only primitives needed here are the
//! error type and the double-SHA-256 writer.

mod error;

pub mod sha256d;

pub use error::SerializationError;
