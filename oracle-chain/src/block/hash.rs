use std::fmt;

use serde::{Deserialize, Serialize};

use crate::serialization::sha256d;
use crate::SerializationError;

/// A hash of a block, used to identify blocks and link blocks into a chain.
///
/// Technically this is the SHA256d hash of the block *header*, but since
/// the header commits to the Merkle root of the transactions it identifies
/// the entire block.
///
/// The bytes are stored in internal (little-endian) order; `Display` and
/// `FromStr` use the big-endian convention set by Bitcoin, which is also
/// what `getblockhash` returns.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Hash an 80-byte serialized header.
    pub fn of_header_bytes(header: &[u8]) -> Hash {
        Hash(sha256d::hash(header))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(&reversed))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.debug_tuple("block::Hash")
            .field(&hex::encode(&reversed))
            .finish()
    }
}

impl std::str::FromStr for Hash {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; 32];
        if hex::decode_to_slice(s, &mut bytes[..]).is_err() {
            Err(SerializationError::Malformed("invalid block hash hex"))
        } else {
            bytes.reverse();
            Ok(Hash(bytes))
        }
    }
}
