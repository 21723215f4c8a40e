//! Transactions and transaction-related structures.
//!
//! The parser is positional: it walks a shared [`Bytes`] block payload and
//! records the byte ranges of the fields that make up the txid preimage.
//! Hashing those original ranges (never a re-serialization) guarantees the
//! txid round-trips byte-exactly no matter how a length happened to be
//! encoded.

mod hash;

#[cfg(test)]
mod tests;

use std::convert::TryInto;
use std::io::Write;

use bytes::Bytes;

pub use hash::Hash;

use crate::{
    compactint::CompactInt,
    serialization::sha256d,
    transparent::{self, OutPoint},
    SerializationError,
};

/// The largest input or output count accepted from a single transaction.
///
/// There is no formal consensus limit, but anything near this is garbage
/// data rather than a transaction, and bounding the count keeps a corrupt
/// length byte from driving a multi-gigabyte preallocation.
const MAX_COUNT: u64 = 100_000;

/// A Bitcoin transaction, parsed segwit-aware from a block payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// The transaction version.
    pub version: i32,
    /// The transaction inputs, at least one.
    pub inputs: Vec<transparent::Input>,
    /// The transaction outputs, at least one.
    pub outputs: Vec<transparent::Output>,
    /// One witness stack per input, present only for segwit transactions.
    pub witness: Option<Vec<WitnessField>>,
    /// The transaction lock time, raw.
    pub lock_time: u32,
    txid: Hash,
}

/// The witness stack attached to one input of a segwit transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WitnessField {
    /// The stack items, bottom first. Each aliases the block payload.
    pub items: Vec<Bytes>,
}

impl WitnessField {
    /// Total bytes across all stack items, excluding length prefixes.
    pub fn total_len(&self) -> usize {
        self.items.iter().map(|item| item.len()).sum()
    }

    /// The size of the largest stack item, or zero for an empty stack.
    pub fn largest_item(&self) -> usize {
        self.items.iter().map(|item| item.len()).max().unwrap_or(0)
    }
}

impl Transaction {
    /// Parse one transaction starting at `start`, returning it together
    /// with the position one past its final byte.
    pub fn parse(payload: &Bytes, start: usize) -> Result<(Transaction, usize), SerializationError> {
        let buf: &[u8] = payload.as_ref();

        let version_raw = take(buf, start, 4, "transaction version")?;
        let version = i32::from_le_bytes(version_raw.try_into().expect("fixed-width slice"));
        let mut pos = start + 4;

        // A segwit transaction carries a zero marker byte where a legacy
        // transaction would start its input count, then a 0x01 flag.
        let segwit = buf.get(pos) == Some(&0x00) && buf.get(pos + 1) == Some(&0x01);
        if segwit {
            pos += 2;
        }

        let inputs_start = pos;
        let (input_count, next) = CompactInt::read(buf, pos)?;
        pos = next;
        if input_count == 0 {
            return Err(SerializationError::Malformed("transaction with no inputs"));
        }
        if input_count > MAX_COUNT {
            return Err(SerializationError::Malformed("absurd input count"));
        }

        let mut inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            let (input, next) = parse_input(payload, pos)?;
            inputs.push(input);
            pos = next;
        }
        let inputs_end = pos;

        let outputs_start = pos;
        let (output_count, next) = CompactInt::read(buf, pos)?;
        pos = next;
        if output_count == 0 {
            return Err(SerializationError::Malformed("transaction with no outputs"));
        }
        if output_count > MAX_COUNT {
            return Err(SerializationError::Malformed("absurd output count"));
        }

        let mut outputs = Vec::with_capacity(output_count as usize);
        for _ in 0..output_count {
            let (output, next) = parse_output(payload, pos)?;
            outputs.push(output);
            pos = next;
        }
        let outputs_end = pos;

        let witness = if segwit {
            let mut fields = Vec::with_capacity(input_count as usize);
            for _ in 0..input_count {
                let (field, next) = parse_witness_field(payload, pos)?;
                fields.push(field);
                pos = next;
            }
            Some(fields)
        } else {
            None
        };

        let lock_raw = take(buf, pos, 4, "transaction lock time")?;
        let lock_time = u32::from_le_bytes(lock_raw.try_into().expect("fixed-width slice"));

        // The txid commits to the legacy serialization: version, inputs,
        // outputs, lock time. Marker, flag, and witness are excluded by
        // hashing the original byte ranges around them.
        let mut hasher = sha256d::Writer::default();
        hasher
            .write_all(version_raw)
            .and_then(|_| hasher.write_all(&buf[inputs_start..inputs_end]))
            .and_then(|_| hasher.write_all(&buf[outputs_start..outputs_end]))
            .and_then(|_| hasher.write_all(lock_raw))
            .expect("sha256d::Writer is infallible");
        let txid = Hash(hasher.finish());

        let tx = Transaction {
            version,
            inputs,
            outputs,
            witness,
            lock_time,
            txid,
        };
        Ok((tx, pos + 4))
    }

    /// The transaction id, computed over the legacy serialization during
    /// parsing.
    pub fn txid(&self) -> Hash {
        self.txid
    }

    /// Returns `true` if this transaction is a coinbase transaction.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && matches!(self.inputs.get(0), Some(transparent::Input::Coinbase { .. }))
    }

    /// Whether the transaction carried the segwit marker and flag.
    pub fn is_segwit(&self) -> bool {
        self.witness.is_some()
    }

    /// Total witness bytes across all inputs, excluding length prefixes.
    pub fn witness_total_len(&self) -> usize {
        match &self.witness {
            Some(fields) => fields.iter().map(WitnessField::total_len).sum(),
            None => 0,
        }
    }

    /// The largest single witness stack item in the transaction.
    pub fn witness_largest_item(&self) -> usize {
        match &self.witness {
            Some(fields) => fields
                .iter()
                .map(WitnessField::largest_item)
                .max()
                .unwrap_or(0),
            None => 0,
        }
    }

    /// The outpoints this transaction spends. Empty for a coinbase.
    pub fn spent_outpoints(&self) -> impl Iterator<Item = &OutPoint> {
        self.inputs.iter().filter_map(transparent::Input::outpoint)
    }
}

fn parse_input(
    payload: &Bytes,
    pos: usize,
) -> Result<(transparent::Input, usize), SerializationError> {
    let buf: &[u8] = payload.as_ref();

    let raw = take(buf, pos, OutPoint::LEN, "input outpoint")?;
    let outpoint = OutPoint {
        hash: Hash(raw[0..32].try_into().expect("fixed-width slice")),
        index: u32::from_le_bytes(raw[32..36].try_into().expect("fixed-width slice")),
    };
    let pos = pos + OutPoint::LEN;

    let (script_len, pos) = CompactInt::read(buf, pos)?;
    let script = slice(payload, pos, script_len, "input script")?;
    let pos = pos + script.len();

    let raw = take(buf, pos, 4, "input sequence")?;
    let sequence = u32::from_le_bytes(raw.try_into().expect("fixed-width slice"));
    let pos = pos + 4;

    let input = if outpoint.is_coinbase_marker() {
        transparent::Input::Coinbase {
            data: transparent::CoinbaseData(script),
            sequence,
        }
    } else {
        transparent::Input::PrevOut {
            outpoint,
            unlock_script: transparent::Script(script),
            sequence,
        }
    };
    Ok((input, pos))
}

fn parse_output(
    payload: &Bytes,
    pos: usize,
) -> Result<(transparent::Output, usize), SerializationError> {
    let buf: &[u8] = payload.as_ref();

    let raw = take(buf, pos, 8, "output value")?;
    let value = transparent::Amount(u64::from_le_bytes(raw.try_into().expect("fixed-width slice")));
    let pos = pos + 8;

    let (script_len, pos) = CompactInt::read(buf, pos)?;
    let script = slice(payload, pos, script_len, "output script")?;
    let pos = pos + script.len();

    let output = transparent::Output {
        value,
        lock_script: transparent::Script(script),
    };
    Ok((output, pos))
}

fn parse_witness_field(
    payload: &Bytes,
    pos: usize,
) -> Result<(WitnessField, usize), SerializationError> {
    let buf: &[u8] = payload.as_ref();

    let (item_count, mut pos) = CompactInt::read(buf, pos)?;
    if item_count > MAX_COUNT {
        return Err(SerializationError::Malformed("absurd witness stack size"));
    }

    let mut items = Vec::with_capacity(item_count as usize);
    for _ in 0..item_count {
        let (item_len, next) = CompactInt::read(buf, pos)?;
        let item = slice(payload, next, item_len, "witness stack item")?;
        pos = next + item.len();
        items.push(item);
    }
    Ok((WitnessField { items }, pos))
}

fn take<'a>(
    buf: &'a [u8],
    pos: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], SerializationError> {
    if pos.checked_add(len).map_or(true, |end| end > buf.len()) {
        return Err(SerializationError::Truncated(what));
    }
    Ok(&buf[pos..pos + len])
}

/// A zero-copy slice of the payload, `len` coming straight off the wire.
fn slice(
    payload: &Bytes,
    pos: usize,
    len: u64,
    what: &'static str,
) -> Result<Bytes, SerializationError> {
    let len = len as usize;
    if pos.checked_add(len).map_or(true, |end| end > payload.len()) {
        return Err(SerializationError::Truncated(what));
    }
    Ok(payload.slice(pos..pos + len))
}
