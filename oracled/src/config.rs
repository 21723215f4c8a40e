//! Run configuration.
//!
//! Everything the pipeline needs from the outside world in one immutable
//! value: where the node's RPC listens, how to authenticate, and where
//! the raw block files live. Loaded from an optional TOML file with
//! platform defaults matching a stock Bitcoin Core install, then
//! overridden by command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use oracle_rpc::Auth;

use crate::OracleError;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// The node's JSON-RPC endpoint.
    pub rpc_url: String,

    /// Explicit RPC credentials. When unset, the cookie file is used.
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,

    /// The cookie file bitcoind writes; defaults to `.cookie` in the
    /// data directory.
    pub rpc_cookie: Option<PathBuf>,

    /// The node's data directory.
    pub data_dir: PathBuf,

    /// The raw block-file directory; defaults to `blocks/` in the data
    /// directory.
    pub blocks_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            rpc_url: "http://127.0.0.1:8332".to_string(),
            rpc_user: None,
            rpc_password: None,
            rpc_cookie: None,
            data_dir: default_data_dir(),
            blocks_dir: None,
        }
    }
}

impl Config {
    /// Load the configuration file, or the defaults when `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Config, OracleError> {
        match path {
            None => Ok(Config::default()),
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    OracleError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                toml::from_str(&raw).map_err(|e| {
                    OracleError::Config(format!("cannot parse {}: {}", path.display(), e))
                })
            }
        }
    }

    /// The effective block-file directory.
    pub fn blocks_dir(&self) -> PathBuf {
        self.blocks_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("blocks"))
    }

    /// The effective RPC authentication.
    pub fn rpc_auth(&self) -> Auth {
        match (&self.rpc_user, &self.rpc_password) {
            (Some(user), Some(password)) => Auth::UserPass(user.clone(), password.clone()),
            _ => Auth::CookieFile(
                self.rpc_cookie
                    .clone()
                    .unwrap_or_else(|| self.data_dir.join(".cookie")),
            ),
        }
    }
}

/// Where a stock Bitcoin Core install keeps its data on this platform.
fn default_data_dir() -> PathBuf {
    if cfg!(any(target_os = "macos", windows)) {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Bitcoin")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bitcoin")
    }
}
