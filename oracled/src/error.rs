use thiserror::Error;

use oracle_price::PriceError;
use oracle_rpc::RpcError;
use oracle_store::StoreError;

/// Everything that can end a run, with the exit code contract the CLI
/// documents: 1 configuration, 2 out-of-range date, 3 RPC, 4 block data.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Parse(#[from] oracle_chain::SerializationError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl OracleError {
    /// The process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            OracleError::Config(_) => 1,
            OracleError::Rpc(RpcError::DateTooRecent { .. })
            | OracleError::Rpc(RpcError::DateTooOld { .. }) => 2,
            // interrupted, in the conventional SIGINT encoding
            OracleError::Rpc(RpcError::Cancelled) => 130,
            OracleError::Rpc(_) => 3,
            OracleError::Store(_) | OracleError::Parse(_) | OracleError::Price(_) => 4,
            OracleError::Output(_) => 1,
        }
    }

    /// Whether this is the cooperative-cancellation pseudo-failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OracleError::Rpc(RpcError::Cancelled))
    }
}
