// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent project bookkeeping backed by redb (pure Rust, ACID).
//!
//! Three related record kinds share one database file: projects, the
//! shareholdings referencing them, and dividend distributions with their
//! per-holder payout log. Projects are keyed by surrogate UUID; name
//! uniqueness is enforced through a separate index table.

mod database;

pub use database::ProjectDatabase;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a project. Only `FUNDING` is modeled; no further
/// transitions exist in the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "FUNDING")]
    Funding,
}

/// Lifecycle status of a dividend distribution.
///
/// `PROCESSING` is written before any payment is submitted. `COMPLETED` is
/// terminal and set only once every per-holder payment has succeeded. A
/// payment failure mid-loop marks the record `FAILED`; the payout log keeps
/// track of which holders were already paid so a later call can resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DividendStatus {
    #[serde(rename = "PROCESSING")]
    Processing,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

/// A solar-farm project and its custodial testnet wallet.
///
/// The wallet seed is stored in clear next to the record. That is a known
/// weakness of the demo, acceptable only because the wallet holds testnet
/// funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub total_power_kw: f64,
    pub total_shares: u64,
    pub share_price_xrp: f64,
    pub wallet_address: String,
    pub wallet_seed: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

/// A wallet's holding of shares in one project. Immutable once written;
/// repeat purchases by the same holder create additional rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredShareholding {
    pub id: String,
    pub project_id: String,
    pub holder_wallet_address: String,
    pub shares_amount: u64,
    pub purchase_date: DateTime<Utc>,
}

/// A batch dividend payout from a project wallet to its shareholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDividend {
    pub id: String,
    pub project_id: String,
    pub amount_xrp: f64,
    pub distribution_date: DateTime<Utc>,
    pub status: DividendStatus,
}

/// One confirmed per-holder payment within a dividend distribution.
///
/// Rows are written as each payment confirms, so an interrupted distribution
/// can be resumed by paying only the holders without a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPayout {
    pub dividend_id: String,
    pub shareholding_id: String,
    pub holder_address: String,
    pub amount_xrp: f64,
    pub tx_hash: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
