// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory ledger double for handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FundedAccount, LedgerError, LedgerGateway, PaymentOutcome};

/// Test double holding balances in memory. Faucet-created accounts start
/// with a configurable balance; payments move funds between accounts.
pub struct MockLedger {
    funding_amount: f64,
    balances: Mutex<HashMap<String, f64>>,
    failing_destinations: Mutex<HashSet<String>>,
    counter: AtomicU64,
    fail_next_funding: Mutex<bool>,
}

impl MockLedger {
    /// Every faucet-created account starts with `funding_amount` XRP.
    pub fn new(funding_amount: f64) -> Self {
        Self {
            funding_amount,
            balances: Mutex::new(HashMap::new()),
            failing_destinations: Mutex::new(HashSet::new()),
            counter: AtomicU64::new(0),
            fail_next_funding: Mutex::new(false),
        }
    }

    pub fn set_balance(&self, address: &str, amount_xrp: f64) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_string(), amount_xrp);
    }

    pub fn balance_of(&self, address: &str) -> Option<f64> {
        self.balances.lock().unwrap().get(address).copied()
    }

    /// Make every payment to `address` fail until cleared.
    pub fn fail_payments_to(&self, address: &str) {
        self.failing_destinations
            .lock()
            .unwrap()
            .insert(address.to_string());
    }

    pub fn clear_payment_failures(&self) {
        self.failing_destinations.lock().unwrap().clear();
    }

    pub fn fail_next_funding(&self) {
        *self.fail_next_funding.lock().unwrap() = true;
    }
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn create_funded_account(&self) -> Result<FundedAccount, LedgerError> {
        if std::mem::take(&mut *self.fail_next_funding.lock().unwrap()) {
            return Err(LedgerError::FundingFailed {
                attempts: 3,
                reason: "mock faucet offline".into(),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let account = FundedAccount {
            address: format!("rMOCK{n}"),
            seed: format!("sMOCK{n}"),
        };
        self.set_balance(&account.address, self.funding_amount);
        Ok(account)
    }

    async fn balance(&self, address: &str) -> Result<f64, LedgerError> {
        self.balance_of(address)
            .ok_or_else(|| LedgerError::BalanceUnavailable {
                address: address.to_string(),
                reason: "account unknown to mock ledger".into(),
            })
    }

    async fn submit_payment(
        &self,
        from: &FundedAccount,
        destination: &str,
        amount_xrp: f64,
    ) -> Result<PaymentOutcome, LedgerError> {
        if self
            .failing_destinations
            .lock()
            .unwrap()
            .contains(destination)
        {
            return Err(LedgerError::PaymentFailed {
                destination: destination.to_string(),
                amount_xrp,
                reason: "mock destination configured to fail".into(),
            });
        }

        let mut balances = self.balances.lock().unwrap();
        let available = balances.get(&from.address).copied().unwrap_or(0.0);
        if available < amount_xrp {
            return Err(LedgerError::PaymentFailed {
                destination: destination.to_string(),
                amount_xrp,
                reason: format!("insufficient balance {available} in {}", from.address),
            });
        }

        *balances.entry(from.address.clone()).or_insert(0.0) -= amount_xrp;
        *balances.entry(destination.to_string()).or_insert(0.0) += amount_xrp;

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentOutcome {
            tx_hash: format!("MOCKTX{n}"),
            result_code: "tesSUCCESS".into(),
        })
    }
}
