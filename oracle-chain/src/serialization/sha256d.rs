//! The double-SHA-256 digest used for block hashes and txids.

use std::io;

use sha2::{Digest, Sha256};

/// A write-through adapter that accumulates a SHA-256 digest.
///
/// `finish` applies the second hash round, so the result is
/// `sha256(sha256(bytes))` in internal (unreversed) byte order.
#[derive(Default)]
pub struct Writer {
    hash: Sha256,
}

impl Writer {
    /// Consume the writer, returning the double hash of everything written.
    pub fn finish(self) -> [u8; 32] {
        let first = self.hash.finalize();
        let second = Sha256::digest(&first[..]);
        let mut out = [0u8; 32];
        out.copy_from_slice(&second[..]);
        out
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hash.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("sha256d::Writer").finish()
    }
}

/// One-shot double hash of a byte slice.
pub fn hash(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(&first[..]);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second[..]);
    out
}
