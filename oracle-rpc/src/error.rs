use chrono::NaiveDate;
use thiserror::Error;

/// An error from the node RPC surface or the day locator built on it.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The transport or the node itself failed. Fatal: the caller's retry
    /// policy has already been exhausted by the transport layer.
    #[error("node rpc failure: {0}")]
    Rpc(#[from] jsonrpc::Error),

    /// The node answered, but not with the shape this client expects.
    #[error("unexpected rpc reply: {0}")]
    BadReply(&'static str),

    /// The target day is not yet buried under six confirmations past its
    /// UTC midnight.
    #[error(
        "date {date} is too recent: the chain tip must be at least six blocks \
         past the following UTC midnight (try -rb for a recent-blocks price)"
    )]
    DateTooRecent { date: NaiveDate },

    /// Before mid-December 2023 round-USD outputs are too sparse for the
    /// histogram to carry a signal.
    #[error("date {date} is before {min}, the earliest day with enough round-USD outputs")]
    DateTooOld { date: NaiveDate, min: NaiveDate },

    /// The run was cancelled between round trips.
    #[error("cancelled")]
    Cancelled,
}
