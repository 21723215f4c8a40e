//! Recorded byte vectors with externally known hashes.

use lazy_static::lazy_static;

/// Display-order hash of the mainnet genesis block.
pub const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

/// Display-order txid of the genesis coinbase transaction.
pub const GENESIS_COINBASE_TXID: &str =
    "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

/// Display-order txid of [`SEGWIT_TX`], computed over the legacy
/// serialization (marker, flag, and witness excluded).
pub const SEGWIT_TXID: &str = "b3b1c83e7d9111adaeb60c76ea6453e173bd2b2103164e7f64f10825bb1c6bf2";

lazy_static! {
    /// The mainnet genesis block payload (header, tx count, coinbase tx)
    /// exactly as stored in `blk00000.dat`, without the magic and size
    /// prefix. 285 bytes; every parser invariant can be checked against
    /// its published hashes.
    pub static ref GENESIS_BLOCK: Vec<u8> = hex::decode(
        "0100000000000000000000000000000000000000000000000000000000000000\
         000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa\
         4b1e5e4a29ab5f49ffff001d1dac2b7c01010000000100000000000000000000\
         00000000000000000000000000000000000000000000ffffffff4d04ffff001d\
         0104455468652054696d65732030332f4a616e2f32303039204368616e63656c\
         6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f75742066\
         6f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe554827\
         1967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4\
         f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000"
    )
    .expect("const-encoded block is valid hex");

    /// The genesis coinbase transaction alone: the block payload minus the
    /// 80-byte header and the one-byte transaction count.
    pub static ref GENESIS_COINBASE_TX: Vec<u8> = GENESIS_BLOCK[81..].to_vec();

    /// A synthetic native-segwit transaction in wire form: one input with
    /// an empty scriptSig, two P2WPKH outputs, and a two-item witness
    /// stack (71-byte signature shape, 33-byte key shape).
    pub static ref SEGWIT_TX: Vec<u8> = hex::decode(
        "02000000000101000102030405060708090a0b0c0d0e0f101112131415161718\
         191a1b1c1d1e1f0100000000fdffffff0215cd5b070000000016001411111111\
         1111111111111111111111111111111180f0fa02000000001600142222222222\
         222222222222222222222222222222024730aaaaaaaaaaaaaaaaaaaaaaaaaaaa\
         aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\
         aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa2102bbbbbbbbbbbb\
         bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb00000000"
    )
    .expect("const-encoded tx is valid hex");
}
