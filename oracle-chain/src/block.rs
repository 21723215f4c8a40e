//! Blocks and block-related structures (heights, headers, hashes).

mod hash;
mod header;
mod height;

#[cfg(test)]
mod tests;

use bytes::Bytes;

pub use hash::Hash;
pub use header::Header;
pub use height::Height;

use crate::{compactint::CompactInt, transaction::Transaction, SerializationError};

/// The mainnet network magic that precedes every block record on disk.
pub const MAINNET_MAGIC: [u8; 4] = [0xF9, 0xBE, 0xB4, 0xD9];

/// The maximum size of a block payload on disk, in bytes.
///
/// After SegWit this includes the size of the witness data.
pub const MAX_BLOCK_BYTES: u64 = 4_000_000;

/// A parsed block: the header plus every transaction in serialized order.
#[derive(Clone, Debug)]
pub struct Block {
    /// The block header, containing block metadata.
    pub header: Header,
    /// The block transactions, in the order they appear in the payload.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Parse a block payload as stored in a `blk*.dat` record: an 80-byte
    /// header, a compact-size transaction count, and the transactions.
    ///
    /// The payload is held as [`Bytes`] so transaction scripts and witness
    /// items can alias it without copying; everything parsed from one block
    /// is dropped together once the pipeline has consumed it.
    pub fn parse(payload: Bytes) -> Result<Block, SerializationError> {
        let header = Header::parse(&payload)?;

        let (tx_count, mut pos) = CompactInt::read(&payload, Header::LEN)?;
        // Each transaction needs at least one input, so this bounds the
        // count well before preallocation could become a problem.
        if tx_count > MAX_BLOCK_BYTES / 60 {
            return Err(SerializationError::Malformed(
                "transaction count exceeds what the payload could hold",
            ));
        }

        let mut transactions = Vec::with_capacity(tx_count as usize);
        for _ in 0..tx_count {
            let (tx, next) = Transaction::parse(&payload, pos)?;
            transactions.push(tx);
            pos = next;
        }

        Ok(Block {
            header,
            transactions,
        })
    }

    /// The hash of this block, computed from the raw header during parsing.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }
}
