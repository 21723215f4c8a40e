//! Access to the raw block files a Bitcoin node keeps on disk.
//!
//! A node's `blocks/` directory holds sequentially numbered `blk*.dat`
//! files, each a concatenation of `[magic][size][payload]` records in the
//! order blocks arrived. The records carry no index, so the oracle scans
//! the files it expects to cover the target day, matching header hashes
//! against the set the chain index said it needs.

mod block_dir;
mod error;

pub use block_dir::{start_file_index, BlockDir, BlockLocation};
pub use error::StoreError;
