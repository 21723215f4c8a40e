//! On-disk Bitcoin data structures and the positional parser used by the
//! price oracle.
//!
//! This crate deliberately covers only the subset of the wire format the
//! oracle consumes: block headers, transactions, outputs, and witnesses as
//! they appear inside `blk*.dat` files. Script interpretation, signature
//! checking, and the peer-to-peer message framing are out of scope.
#![deny(missing_debug_implementations)]

pub mod block;
pub mod compactint;
pub mod serialization;
pub mod transaction;
pub mod transparent;

pub use serialization::SerializationError;
