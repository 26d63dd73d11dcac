// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! XRP Ledger testnet integration.
//!
//! All blockchain interaction goes through the [`LedgerGateway`] trait:
//! account creation and faucet funding, balance queries, and payment
//! submission. The production implementation ([`XrplGateway`]) talks JSON-RPC
//! to a testnet node; handlers receive the gateway as an injected trait
//! object so tests can swap in a double.

mod xrpl;

#[cfg(test)]
pub mod mock;

pub use xrpl::XrplGateway;

use async_trait::async_trait;

/// Drops per XRP. Amounts on the wire are integer drops.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// A testnet account we control: classic address plus the family seed
/// needed to sign (or sign-and-submit) payments from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundedAccount {
    pub address: String,
    pub seed: String,
}

/// Result of a confirmed payment.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Transaction hash on the ledger.
    pub tx_hash: String,
    /// Final transaction result code (`tesSUCCESS` on success).
    pub result_code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to fund wallet after {attempts} attempts: {reason}")]
    FundingFailed { attempts: u32, reason: String },

    #[error("account {address} never appeared in a validated ledger")]
    FundingTimeout { address: String },

    #[error("balance query for {address} failed: {reason}")]
    BalanceUnavailable { address: String, reason: String },

    #[error("payment of {amount_xrp} XRP to {destination} failed: {reason}")]
    PaymentFailed {
        destination: String,
        amount_xrp: f64,
        reason: String,
    },

    #[error("ledger RPC request failed: {0}")]
    Rpc(String),
}

/// Gateway to the external ledger network.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Create a fresh account and fund it from the testnet faucet, blocking
    /// until the account is visible in a validated ledger.
    async fn create_funded_account(&self) -> Result<FundedAccount, LedgerError>;

    /// XRP balance of an account. A failed query is an error, never zero.
    async fn balance(&self, address: &str) -> Result<f64, LedgerError>;

    /// Submit a payment and block until it is confirmed in a validated
    /// ledger with a `tesSUCCESS` result.
    async fn submit_payment(
        &self,
        from: &FundedAccount,
        destination: &str,
        amount_xrp: f64,
    ) -> Result<PaymentOutcome, LedgerError>;
}

/// Convert an XRP amount to integer drops for the wire.
pub fn xrp_to_drops(amount_xrp: f64) -> u64 {
    (amount_xrp * DROPS_PER_XRP as f64).round() as u64
}

/// Convert integer drops back to an XRP amount.
pub fn drops_to_xrp(drops: u64) -> f64 {
    drops as f64 / DROPS_PER_XRP as f64
}
