//! Transaction inputs and outputs as they appear on the wire.

use std::fmt;

use bytes::Bytes;

use crate::transaction;

/// The first opcode of a data-carrier (OP_RETURN) output script.
pub const OP_RETURN: u8 = 0x6A;

/// An output value in satoshis.
///
/// Stored exactly as the unsigned 8-byte little-endian wire field; the
/// histogram works in BTC, so conversion happens at the boundary.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Amount(pub u64);

impl Amount {
    /// This amount in BTC.
    pub fn to_btc(self) -> f64 {
        self.0 as f64 / 1e8
    }
}

/// A reference to an output of a previous transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct OutPoint {
    /// The transaction that created the output being spent.
    pub hash: transaction::Hash,

    /// Which output of that transaction is referenced; the first is 0.
    pub index: u32,
}

impl OutPoint {
    /// The serialized length of an outpoint in bytes.
    pub const LEN: usize = 36;

    /// True for the outpoint pattern reserved for coinbase inputs: an
    /// all-zero hash and index `0xFFFF_FFFF`.
    pub fn is_coinbase_marker(&self) -> bool {
        self.index == u32::MAX && self.hash.0 == [0u8; 32]
    }
}

/// A transaction input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
    /// A spend of a previous transaction output.
    PrevOut {
        /// The previous output being spent.
        outpoint: OutPoint,
        /// The script that authorizes the spend. Empty for native segwit
        /// spends, whose authorization lives in the witness.
        unlock_script: Script,
        /// The sequence number.
        sequence: u32,
    },
    /// New coin created by the block reward.
    Coinbase {
        /// Free-form data inserted by the miner (the block height after
        /// BIP 34, then anything).
        data: CoinbaseData,
        /// The sequence number.
        sequence: u32,
    },
}

impl Input {
    /// The outpoint spent by this input, if it is not a coinbase.
    pub fn outpoint(&self) -> Option<&OutPoint> {
        match self {
            Input::PrevOut { outpoint, .. } => Some(outpoint),
            Input::Coinbase { .. } => None,
        }
    }
}

/// A transaction output: a value and the script that locks it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Output {
    /// The value locked by this output.
    pub value: Amount,

    /// The conditions under which the output can be spent.
    pub lock_script: Script,
}

impl Output {
    /// True when the locking script starts with OP_RETURN, marking the
    /// output as unspendable data carriage.
    pub fn is_op_return(&self) -> bool {
        self.lock_script.0.first() == Some(&OP_RETURN)
    }
}

/// An encoding of a Bitcoin script.
///
/// The bytes alias the block payload they were parsed from; the oracle
/// never interprets scripts beyond the OP_RETURN check.
#[derive(Clone, Eq, PartialEq)]
pub struct Script(pub Bytes);

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Script")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

/// Arbitrary data carried in a coinbase input where the unlock script
/// would otherwise be.
#[derive(Clone, Eq, PartialEq)]
pub struct CoinbaseData(pub Bytes);

impl fmt::Debug for CoinbaseData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let escaped = String::from_utf8(
            self.0
                .iter()
                .cloned()
                .flat_map(std::ascii::escape_default)
                .collect(),
        )
        .expect("ascii::escape_default produces utf8");
        f.debug_tuple("CoinbaseData").field(&escaped).finish()
    }
}
