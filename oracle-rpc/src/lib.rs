//! The oracle's view of a running Bitcoin node.
//!
//! Only three RPCs are consumed: `getblockcount`, `getblockhash`, and
//! `getblockheader`. They are wrapped behind the [`ChainView`] trait so
//! the day locator (and everything above it) can be driven by a recorded
//! or synthetic chain in tests.

mod cancel;
mod client;
mod error;

pub mod locator;

pub use cancel::CancelToken;
pub use client::{Auth, Client};
pub use error::RpcError;

use chrono::{DateTime, Utc};

use oracle_chain::block::{self, Height};

/// The header fields the oracle reads, out of everything `getblockheader`
/// returns.
#[derive(Clone, Copy, Debug)]
pub struct HeaderInfo {
    /// The miner-reported block time.
    pub time: DateTime<Utc>,
    /// The height of the block in the main chain.
    pub height: Height,
}

/// The minimal chain-index surface the oracle consumes.
pub trait ChainView {
    /// The height of the chain tip.
    fn block_count(&self) -> Result<Height, RpcError>;

    /// The main-chain block hash at `height`.
    fn block_hash(&self, height: Height) -> Result<block::Hash, RpcError>;

    /// Header metadata for the block with the given hash.
    fn block_header(&self, hash: &block::Hash) -> Result<HeaderInfo, RpcError>;
}
