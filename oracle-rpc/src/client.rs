use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use oracle_chain::block::{self, Height};

use crate::{ChainView, HeaderInfo, RpcError};

/// Wall-clock budget for one RPC round trip.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// How the client authenticates against the node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Auth {
    /// Explicit rpcuser/rpcpassword credentials.
    UserPass(String, String),
    /// The `.cookie` file bitcoind writes into its data directory.
    CookieFile(PathBuf),
}

impl Auth {
    /// Resolve to the user/password pair `jsonrpc` needs.
    fn user_pass(&self) -> Result<(String, Option<String>), RpcError> {
        match self {
            Auth::UserPass(user, pass) => Ok((user.clone(), Some(pass.clone()))),
            Auth::CookieFile(path) => {
                let line = BufReader::new(File::open(path).map_err(|_| {
                    RpcError::BadReply("cannot read rpc cookie file")
                })?)
                .lines()
                .next()
                .ok_or(RpcError::BadReply("empty rpc cookie file"))?
                .map_err(|_| RpcError::BadReply("cannot read rpc cookie file"))?;
                let colon = line
                    .find(':')
                    .ok_or(RpcError::BadReply("malformed rpc cookie file"))?;
                Ok((line[..colon].into(), Some(line[colon + 1..].into())))
            }
        }
    }
}

/// A blocking JSON-RPC client for the three calls the oracle makes.
pub struct Client {
    inner: jsonrpc::client::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "oracle_rpc::Client({:?})", self.inner)
    }
}

impl Client {
    /// Connect to a node's JSON-RPC endpoint, e.g. `http://127.0.0.1:8332`.
    pub fn new(url: &str, auth: &Auth) -> Result<Client, RpcError> {
        let (user, pass) = auth.user_pass()?;
        let transport = jsonrpc::http::minreq_http::Builder::new()
            .timeout(RPC_TIMEOUT)
            .url(url)
            .map_err(|e| RpcError::Rpc(jsonrpc::Error::Transport(Box::new(e))))?
            .basic_auth(user, pass)
            .build();
        Ok(Client {
            inner: jsonrpc::client::Client::with_transport(transport),
        })
    }

    /// Call an RPC `method` with the given positional parameters.
    fn call<T: for<'de> serde::de::Deserialize<'de>>(
        &self,
        method: &str,
        params: &[serde_json::Value],
    ) -> Result<T, RpcError> {
        let raw = serde_json::value::to_raw_value(params)
            .map_err(|_| RpcError::BadReply("parameters failed to serialize"))?;
        let request = self.inner.build_request(method, Some(&*raw));
        debug!(method, "rpc request");
        let response = self.inner.send_request(request)?;
        Ok(response.result()?)
    }
}

#[derive(Deserialize)]
struct RawHeader {
    time: i64,
    height: u64,
}

impl ChainView for Client {
    fn block_count(&self) -> Result<Height, RpcError> {
        let count: u64 = self.call("getblockcount", &[])?;
        Ok(Height(count))
    }

    fn block_hash(&self, height: Height) -> Result<block::Hash, RpcError> {
        let hex: String = self.call("getblockhash", &[height.0.into()])?;
        hex.parse()
            .map_err(|_| RpcError::BadReply("getblockhash returned malformed hex"))
    }

    fn block_header(&self, hash: &block::Hash) -> Result<HeaderInfo, RpcError> {
        let raw: RawHeader =
            self.call("getblockheader", &[hash.to_string().into(), true.into()])?;
        Ok(HeaderInfo {
            time: Utc.timestamp(raw.time, 0),
            height: Height(raw.height),
        })
    }
}
