// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded table store for projects, shareholdings, and dividends.
//!
//! ## Table Layout
//!
//! - `projects`: project_id → serialized StoredProject
//! - `project_names`: name → project_id (uniqueness index)
//! - `shareholdings`: composite key (project_id|seq_be) → StoredShareholding
//! - `dividends`: composite key (project_id|seq_be) → StoredDividend
//! - `dividend_index`: dividend_id → composite key bytes
//! - `payouts`: composite key (dividend_id|seq_be) → StoredPayout
//! - `meta`: key → u64 (monotonic sequence counter)
//!
//! The big-endian sequence number in the composite keys makes forward range
//! scans return rows in insertion order.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{
    DividendStatus, StorageError, StorageResult, StoredDividend, StoredPayout, StoredProject,
    StoredShareholding,
};

const PROJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");
const PROJECT_NAMES: TableDefinition<&str, &str> = TableDefinition::new("project_names");
const SHAREHOLDINGS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("shareholdings");
const DIVIDENDS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("dividends");
const DIVIDEND_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("dividend_index");
const PAYOUTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("payouts");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_SEQ: &str = "next_seq";

/// Build a composite key `scope_id | seq_be` for ordered range scans.
fn make_scoped_key(scope_id: &str, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(scope_id.len() + 1 + 8);
    key.extend_from_slice(scope_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Lower bound for scanning every row under a scope id.
fn make_prefix(scope_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(scope_id.len() + 1);
    prefix.extend_from_slice(scope_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a scope scan (prefix with 0xFF bytes past any valid seq).
fn make_prefix_end(scope_id: &str) -> Vec<u8> {
    let mut end = make_prefix(scope_id);
    end.extend_from_slice(&[0xFF; 9]);
    end
}

/// Embedded ACID store for the crowdfunding records.
pub struct ProjectDatabase {
    db: Database,
}

impl ProjectDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PROJECTS)?;
            let _ = write_txn.open_table(PROJECT_NAMES)?;
            let _ = write_txn.open_table(SHAREHOLDINGS)?;
            let _ = write_txn.open_table(DIVIDENDS)?;
            let _ = write_txn.open_table(DIVIDEND_INDEX)?;
            let _ = write_txn.open_table(PAYOUTS)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Insert a new project. Both the id and the name must be unused.
    pub fn create_project(&self, project: &StoredProject) -> StorageResult<()> {
        let json = serde_json::to_vec(project)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut names = write_txn.open_table(PROJECT_NAMES)?;
            if names.get(project.name.as_str())?.is_some() {
                return Err(StorageError::Duplicate(format!(
                    "Project name '{}' already exists",
                    project.name
                )));
            }

            let mut projects = write_txn.open_table(PROJECTS)?;
            if projects.get(project.id.as_str())?.is_some() {
                return Err(StorageError::Duplicate(format!(
                    "Project id '{}' already exists",
                    project.id
                )));
            }

            projects.insert(project.id.as_str(), json.as_slice())?;
            names.insert(project.name.as_str(), project.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Fetch a project by id.
    pub fn project(&self, project_id: &str) -> StorageResult<StoredProject> {
        let read_txn = self.db.begin_read()?;
        let projects = read_txn.open_table(PROJECTS)?;
        let Some(guard) = projects.get(project_id)? else {
            return Err(StorageError::NotFound("Project not found".into()));
        };
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Whether a project name is already registered.
    pub fn name_taken(&self, name: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let names = read_txn.open_table(PROJECT_NAMES)?;
        Ok(names.get(name)?.is_some())
    }

    /// Every project, ordered by id.
    pub fn projects(&self) -> StorageResult<Vec<StoredProject>> {
        let read_txn = self.db.begin_read()?;
        let projects = read_txn.open_table(PROJECTS)?;

        let mut out = Vec::new();
        for entry in projects.iter()? {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(value.value())?);
        }
        Ok(out)
    }

    // =========================================================================
    // Shareholdings
    // =========================================================================

    /// Append a shareholding for an existing project.
    pub fn insert_shareholding(&self, holding: &StoredShareholding) -> StorageResult<()> {
        let json = serde_json::to_vec(holding)?;

        let write_txn = self.db.begin_write()?;
        {
            let projects = write_txn.open_table(PROJECTS)?;
            if projects.get(holding.project_id.as_str())?.is_none() {
                return Err(StorageError::NotFound("Project not found".into()));
            }

            let seq = next_seq(&write_txn)?;
            let key = make_scoped_key(&holding.project_id, seq);
            let mut holdings = write_txn.open_table(SHAREHOLDINGS)?;
            holdings.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Shareholdings of a project in insertion order (possibly empty).
    pub fn shareholdings(&self, project_id: &str) -> StorageResult<Vec<StoredShareholding>> {
        let read_txn = self.db.begin_read()?;
        let holdings = read_txn.open_table(SHAREHOLDINGS)?;
        scan_scope(&holdings, project_id)
    }

    // =========================================================================
    // Dividends
    // =========================================================================

    /// Append a dividend distribution record for an existing project.
    pub fn insert_dividend(&self, dividend: &StoredDividend) -> StorageResult<()> {
        let json = serde_json::to_vec(dividend)?;

        let write_txn = self.db.begin_write()?;
        {
            let projects = write_txn.open_table(PROJECTS)?;
            if projects.get(dividend.project_id.as_str())?.is_none() {
                return Err(StorageError::NotFound("Project not found".into()));
            }

            let seq = next_seq(&write_txn)?;
            let key = make_scoped_key(&dividend.project_id, seq);
            let mut dividends = write_txn.open_table(DIVIDENDS)?;
            dividends.insert(key.as_slice(), json.as_slice())?;

            let mut index = write_txn.open_table(DIVIDEND_INDEX)?;
            index.insert(dividend.id.as_str(), key.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Dividend distributions of a project in insertion order.
    pub fn dividends(&self, project_id: &str) -> StorageResult<Vec<StoredDividend>> {
        let read_txn = self.db.begin_read()?;
        let dividends = read_txn.open_table(DIVIDENDS)?;
        scan_scope(&dividends, project_id)
    }

    /// Fetch a dividend distribution by id.
    pub fn dividend(&self, dividend_id: &str) -> StorageResult<StoredDividend> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(DIVIDEND_INDEX)?;
        let Some(key) = index.get(dividend_id)? else {
            return Err(StorageError::NotFound("Dividend not found".into()));
        };

        let dividends = read_txn.open_table(DIVIDENDS)?;
        let Some(guard) = dividends.get(key.value())? else {
            return Err(StorageError::NotFound("Dividend not found".into()));
        };
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Update the status of a dividend distribution.
    pub fn set_dividend_status(
        &self,
        dividend_id: &str,
        status: DividendStatus,
    ) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let index = write_txn.open_table(DIVIDEND_INDEX)?;
            let Some(key_guard) = index.get(dividend_id)? else {
                return Err(StorageError::NotFound("Dividend not found".into()));
            };
            let key = key_guard.value().to_vec();
            drop(key_guard);

            let mut dividends = write_txn.open_table(DIVIDENDS)?;
            let mut record: StoredDividend = {
                let Some(guard) = dividends.get(key.as_slice())? else {
                    return Err(StorageError::NotFound("Dividend not found".into()));
                };
                serde_json::from_slice(guard.value())?
            };
            record.status = status;
            let json = serde_json::to_vec(&record)?;
            dividends.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Payout log
    // =========================================================================

    /// Record one confirmed per-holder payment of a distribution.
    pub fn record_payout(&self, payout: &StoredPayout) -> StorageResult<()> {
        let json = serde_json::to_vec(payout)?;

        let write_txn = self.db.begin_write()?;
        {
            let seq = next_seq(&write_txn)?;
            let key = make_scoped_key(&payout.dividend_id, seq);
            let mut payouts = write_txn.open_table(PAYOUTS)?;
            payouts.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Confirmed payouts of a distribution in payment order.
    pub fn payouts(&self, dividend_id: &str) -> StorageResult<Vec<StoredPayout>> {
        let read_txn = self.db.begin_read()?;
        let payouts = read_txn.open_table(PAYOUTS)?;
        scan_scope(&payouts, dividend_id)
    }
}

/// Allocate the next value of the monotonic sequence counter within `txn`.
fn next_seq(txn: &redb::WriteTransaction) -> StorageResult<u64> {
    let mut meta = txn.open_table(META)?;
    let seq = meta.get(NEXT_SEQ)?.map(|g| g.value()).unwrap_or(0);
    meta.insert(NEXT_SEQ, seq + 1)?;
    Ok(seq)
}

/// Deserialize every row whose composite key starts with `scope_id|`.
fn scan_scope<T: serde::de::DeserializeOwned>(
    table: &impl ReadableTable<&'static [u8], &'static [u8]>,
    scope_id: &str,
) -> StorageResult<Vec<T>> {
    let lo = make_prefix(scope_id);
    let hi = make_prefix_end(scope_id);

    let mut out = Vec::new();
    for entry in table.range(lo.as_slice()..hi.as_slice())? {
        let (_, value) = entry?;
        out.push(serde_json::from_slice(value.value())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn open_db() -> (ProjectDatabase, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let db = ProjectDatabase::open(&dir.path().join("test.redb")).expect("open db");
        (db, dir)
    }

    fn sample_project(name: &str) -> StoredProject {
        StoredProject {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: "20MW plant".into(),
            location: "Phoenix, AZ".into(),
            total_power_kw: 20_000.0,
            total_shares: 1000,
            share_price_xrp: 0.5,
            wallet_address: "rPROJECT".into(),
            wallet_seed: "sPROJECT".into(),
            status: super::super::ProjectStatus::Funding,
            created_at: Utc::now(),
        }
    }

    fn sample_holding(project_id: &str, address: &str, shares: u64) -> StoredShareholding {
        StoredShareholding {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            holder_wallet_address: address.to_string(),
            shares_amount: shares,
            purchase_date: Utc::now(),
        }
    }

    #[test]
    fn create_and_fetch_project() {
        let (db, _dir) = open_db();
        let project = sample_project("Desert Sun");
        db.create_project(&project).expect("create");

        let fetched = db.project(&project.id).expect("fetch");
        assert_eq!(fetched.name, "Desert Sun");
        assert_eq!(fetched.total_shares, 1000);
        assert!(db.name_taken("Desert Sun").unwrap());
        assert!(!db.name_taken("Ocean Breeze").unwrap());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let (db, _dir) = open_db();
        db.create_project(&sample_project("Desert Sun")).unwrap();

        let err = db
            .create_project(&sample_project("Desert Sun"))
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));

        // The second insert must not have left partial state behind.
        assert_eq!(db.projects().unwrap().len(), 1);
    }

    #[test]
    fn missing_project_is_not_found() {
        let (db, _dir) = open_db();
        let err = db.project("nope").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn shareholdings_require_existing_project() {
        let (db, _dir) = open_db();
        let err = db
            .insert_shareholding(&sample_holding("ghost", "rHOLDER", 10))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn shareholdings_come_back_in_insertion_order() {
        let (db, _dir) = open_db();
        let project = sample_project("Desert Sun");
        db.create_project(&project).unwrap();

        for (addr, shares) in [("rA", 300), ("rB", 700), ("rC", 50)] {
            db.insert_shareholding(&sample_holding(&project.id, addr, shares))
                .unwrap();
        }

        let holdings = db.shareholdings(&project.id).unwrap();
        let addresses: Vec<_> = holdings
            .iter()
            .map(|h| h.holder_wallet_address.as_str())
            .collect();
        assert_eq!(addresses, vec!["rA", "rB", "rC"]);

        // Unrelated project scans stay empty.
        let other = sample_project("Ocean Breeze");
        db.create_project(&other).unwrap();
        assert!(db.shareholdings(&other.id).unwrap().is_empty());
    }

    #[test]
    fn dividend_lifecycle_and_payout_log() {
        let (db, _dir) = open_db();
        let project = sample_project("Desert Sun");
        db.create_project(&project).unwrap();

        let dividend = StoredDividend {
            id: Uuid::new_v4().to_string(),
            project_id: project.id.clone(),
            amount_xrp: 10.0,
            distribution_date: Utc::now(),
            status: DividendStatus::Processing,
        };
        db.insert_dividend(&dividend).unwrap();

        let fetched = db.dividend(&dividend.id).unwrap();
        assert_eq!(fetched.status, DividendStatus::Processing);

        db.record_payout(&StoredPayout {
            dividend_id: dividend.id.clone(),
            shareholding_id: "holding-1".into(),
            holder_address: "rA".into(),
            amount_xrp: 10.0,
            tx_hash: Some("ABC123".into()),
            paid_at: Utc::now(),
        })
        .unwrap();

        db.set_dividend_status(&dividend.id, DividendStatus::Completed)
            .unwrap();
        assert_eq!(
            db.dividend(&dividend.id).unwrap().status,
            DividendStatus::Completed
        );

        let payouts = db.payouts(&dividend.id).unwrap();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].holder_address, "rA");

        let listed = db.dividends(&project.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, DividendStatus::Completed);
    }

    #[test]
    fn unknown_dividend_update_is_not_found() {
        let (db, _dir) = open_db();
        let err = db
            .set_dividend_status("ghost", DividendStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
