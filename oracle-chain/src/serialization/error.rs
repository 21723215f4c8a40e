use std::io;

use thiserror::Error;

/// An error while interpreting raw block bytes.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// An io error that prevented deserialization
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The payload ended before a fixed-size or counted field was complete.
    #[error("truncated data: {0}")]
    Truncated(&'static str),
    /// A parsed field violated a structural bound.
    #[error("malformed transaction: {0}")]
    Malformed(&'static str),
}
