use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SerializationError;

/// A transaction hash (txid).
///
/// The txid is the double SHA-256 of the transaction's legacy
/// serialization (version, inputs, outputs, lock time), excluding the
/// segwit marker, flag, and witness data. Stored in internal byte order;
/// displayed big-endian like every Bitcoin tool does.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

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
        f.debug_tuple("transaction::Hash")
            .field(&hex::encode(&reversed))
            .finish()
    }
}

impl std::str::FromStr for Hash {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; 32];
        if hex::decode_to_slice(s, &mut bytes[..]).is_err() {
            Err(SerializationError::Malformed("invalid txid hex"))
        } else {
            bytes.reverse();
            Ok(Hash(bytes))
        }
    }
}
