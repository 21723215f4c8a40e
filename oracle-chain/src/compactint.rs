//! Bitcoin's variable-length unsigned integer encoding.

use std::convert::TryInto;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::SerializationError;

/// A compact-size integer: 1, 3, 5, or 9 bytes on the wire.
///
/// Parsing is positional: the caller hands in the payload slice and a
/// cursor, and gets back the decoded value together with the position one
/// past the encoding. Keeping the position (rather than an io::Read
/// cursor) lets callers slice out the exact raw bytes afterwards, which
/// the txid computation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactInt(u64);

impl CompactInt {
    pub fn from(value: usize) -> CompactInt {
        CompactInt(value as u64)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The encoded length of `value` in bytes.
    pub fn size(value: usize) -> usize {
        if value < 0xFD {
            1
        } else if value <= u16::MAX as usize {
            3
        } else if value <= u32::MAX as usize {
            5
        } else {
            9
        }
    }

    /// Decode the compact-size integer at `pos`, returning the value and
    /// the position just past it.
    pub fn read(buf: &[u8], pos: usize) -> Result<(u64, usize), SerializationError> {
        let first = *buf
            .get(pos)
            .ok_or(SerializationError::Truncated("compact-size lead byte"))?;
        match first {
            0xFD => {
                let raw = take(buf, pos + 1, 2, "compact-size u16")?;
                Ok((u16::from_le_bytes(raw.try_into().expect("fixed-width slice")) as u64, pos + 3))
            }
            0xFE => {
                let raw = take(buf, pos + 1, 4, "compact-size u32")?;
                Ok((u32::from_le_bytes(raw.try_into().expect("fixed-width slice")) as u64, pos + 5))
            }
            0xFF => {
                let raw = take(buf, pos + 1, 8, "compact-size u64")?;
                Ok((u64::from_le_bytes(raw.try_into().expect("fixed-width slice")), pos + 9))
            }
            small => Ok((small as u64, pos + 1)),
        }
    }

    /// Append the canonical encoding of this value to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        if self.0 < 0xFD {
            out.push(self.0 as u8);
        } else if self.0 <= u16::MAX as u64 {
            out.push(0xFD);
            out.write_u16::<LittleEndian>(self.0 as u16)
                .expect("writing to a Vec is infallible");
        } else if self.0 <= u32::MAX as u64 {
            out.push(0xFE);
            out.write_u32::<LittleEndian>(self.0 as u32)
                .expect("writing to a Vec is infallible");
        } else {
            out.push(0xFF);
            out.write_u64::<LittleEndian>(self.0)
                .expect("writing to a Vec is infallible");
        }
    }
}

fn take<'a>(
    buf: &'a [u8],
    pos: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], SerializationError> {
    if pos + len > buf.len() {
        return Err(SerializationError::Truncated(what));
    }
    Ok(&buf[pos..pos + len])
}
