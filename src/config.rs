// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the embedded database file | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `XRPL_RPC_URL` | XRP Ledger JSON-RPC endpoint | testnet cluster |
//! | `XRPL_FAUCET_URL` | Testnet faucet account endpoint | altnet faucet |
//! | `FUNDING_FAUCET_ATTEMPTS` | Create-and-fund cycles before giving up | `3` |
//! | `FUNDING_RETRY_DELAY_SECS` | Initial delay between faucet cycles (doubles each retry) | `5` |
//! | `FUNDING_POLL_ATTEMPTS` | `account_info` polls per funding cycle | `10` |
//! | `FUNDING_POLL_INTERVAL_SECS` | Delay between `account_info` polls | `2` |
//! | `FUNDING_DEADLINE_SECS` | Hard deadline for one create-and-fund call | `120` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "solar_crowdfund.redb";

/// Public XRP Ledger testnet JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://s.altnet.rippletest.net:51234";

/// Testnet faucet endpoint; a POST creates and funds a fresh account.
pub const DEFAULT_FAUCET_URL: &str = "https://faucet.altnet.rippletest.net/accounts";

/// Retry and polling policy for wallet funding and payment confirmation.
///
/// The original demo hard-coded these loops; keeping them in configuration
/// makes every network wait bounded and tunable, and lets tests shrink the
/// delays to zero.
#[derive(Debug, Clone)]
pub struct FundingPolicy {
    /// Full create-and-fund cycles to attempt before failing.
    pub faucet_attempts: u32,
    /// Delay after a failed faucet cycle; doubles on each retry.
    pub retry_delay: Duration,
    /// `account_info` polls per cycle while waiting for the account to appear.
    pub poll_attempts: u32,
    /// Delay between `account_info` polls.
    pub poll_interval: Duration,
    /// Hard deadline for a single `create_funded_account` call.
    pub deadline: Duration,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self {
            faucet_attempts: 3,
            retry_delay: Duration::from_secs(5),
            poll_attempts: 10,
            poll_interval: Duration::from_secs(2),
            deadline: Duration::from_secs(120),
        }
    }
}

impl FundingPolicy {
    /// Near-zero delays for tests.
    pub fn immediate() -> Self {
        Self {
            faucet_attempts: 2,
            retry_delay: Duration::from_millis(1),
            poll_attempts: 2,
            poll_interval: Duration::from_millis(1),
            deadline: Duration::from_secs(5),
        }
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub rpc_url: String,
    pub faucet_url: String,
    pub funding: FundingPolicy,
}

impl Settings {
    /// Load settings from the environment, falling back to testnet defaults.
    pub fn from_env() -> Self {
        let rpc_url = env::var("XRPL_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        if Url::parse(&rpc_url).is_err() {
            tracing::warn!(%rpc_url, "XRPL_RPC_URL is not a valid URL");
        }
        let faucet_url =
            env::var("XRPL_FAUCET_URL").unwrap_or_else(|_| DEFAULT_FAUCET_URL.to_string());
        if Url::parse(&faucet_url).is_err() {
            tracing::warn!(%faucet_url, "XRPL_FAUCET_URL is not a valid URL");
        }

        let defaults = FundingPolicy::default();
        let funding = FundingPolicy {
            faucet_attempts: env_u64("FUNDING_FAUCET_ATTEMPTS", defaults.faucet_attempts as u64)
                as u32,
            retry_delay: Duration::from_secs(env_u64(
                "FUNDING_RETRY_DELAY_SECS",
                defaults.retry_delay.as_secs(),
            )),
            poll_attempts: env_u64("FUNDING_POLL_ATTEMPTS", defaults.poll_attempts as u64) as u32,
            poll_interval: Duration::from_secs(env_u64(
                "FUNDING_POLL_INTERVAL_SECS",
                defaults.poll_interval.as_secs(),
            )),
            deadline: Duration::from_secs(env_u64(
                "FUNDING_DEADLINE_SECS",
                defaults.deadline.as_secs(),
            )),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            data_dir: env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            rpc_url,
            faucet_url,
            funding,
        }
    }

    /// Full path of the embedded database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
