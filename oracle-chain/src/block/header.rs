use std::convert::TryInto;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use super::Hash;
use crate::SerializationError;

/// A block header, containing metadata about a block.
///
/// Headers are fixed-size and live at the start of every block payload;
/// the double hash of the raw 80 bytes is the canonical block hash, so the
/// parser hashes the slice before splitting out the fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    /// The block's version field.
    pub version: u32,

    /// The hash of the previous block, which chains this block to its
    /// parent all the way back to genesis.
    pub previous_block_hash: Hash,

    /// The root of the transaction Merkle tree, binding the header to the
    /// transactions in the block.
    pub merkle_root: MerkleRoot,

    /// The miner-reported Unix time the header was hashed at.
    ///
    /// The day locator and the histogram window are keyed entirely off
    /// this field.
    pub time: DateTime<Utc>,

    /// The difficulty target in nBits format.
    pub difficulty_bits: u32,

    /// Arbitrary miner-chosen value that makes the header hash meet the
    /// difficulty target.
    pub nonce: u32,

    hash: Hash,
}

impl Header {
    /// The serialized length of a header in bytes.
    pub const LEN: usize = 80;

    /// Byte offset of the timestamp field within the raw header.
    pub const TIME_OFFSET: usize = 68;

    /// Parse the 80-byte header at the front of `payload`, computing the
    /// block hash from the raw bytes.
    pub fn parse(payload: &[u8]) -> Result<Header, SerializationError> {
        if payload.len() < Header::LEN {
            return Err(SerializationError::Truncated("block header"));
        }
        let raw = &payload[..Header::LEN];
        let hash = Hash::of_header_bytes(raw);

        Ok(Header {
            version: le_u32(raw, 0),
            previous_block_hash: Hash(word(raw, 4)),
            merkle_root: MerkleRoot(word(raw, 36)),
            time: Utc.timestamp(le_u32(raw, Header::TIME_OFFSET) as i64, 0),
            difficulty_bits: le_u32(raw, 72),
            nonce: le_u32(raw, 76),
            hash,
        })
    }

    /// The hash of this header, cached at parse time.
    pub fn hash(&self) -> Hash {
        self.hash
    }
}

fn le_u32(raw: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(raw[offset..offset + 4].try_into().expect("fixed-width slice"))
}

fn word(raw: &[u8], offset: usize) -> [u8; 32] {
    raw[offset..offset + 32].try_into().expect("fixed-width slice")
}

/// The root of a block's transaction Merkle tree.
///
/// The oracle parses but never recomputes it; block integrity is already
/// guaranteed by matching the header hash against the node's chain index.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct MerkleRoot(pub [u8; 32]);

impl fmt::Debug for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.debug_tuple("MerkleRoot")
            .field(&hex::encode(&reversed))
            .finish()
    }
}
