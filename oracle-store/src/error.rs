use std::io;

use thiserror::Error;

/// An error while locating or reading raw block data.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The scan reached the end of the block files with targets still
    /// unresolved. Usually the node is pruned or the directory is wrong.
    #[error("reached the end of the block files without finding {missing} of {wanted} blocks")]
    BlocksNotFound { missing: usize, wanted: usize },

    /// The node wrote its block files XOR-obfuscated (a non-zero
    /// `xor.dat`). Reading those is not supported.
    #[error("block files are XOR-obfuscated; re-run the node with blocksxor=0")]
    XorRequired,

    /// A record read back from a previously scanned location no longer
    /// looks like a block.
    #[error("corrupt block record: {0}")]
    Corrupt(&'static str),

    #[error(transparent)]
    Serialization(#[from] oracle_chain::SerializationError),
}
