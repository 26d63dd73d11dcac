// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! XRPL testnet gateway over JSON-RPC.
//!
//! Signing is delegated to the node's sign-and-submit mode (`submit` with the
//! account seed), which is acceptable only against a throwaway testnet. The
//! faucet endpoint both creates and funds accounts, so key generation also
//! stays outside this process.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::{FundingPolicy, Settings};

use super::{
    drops_to_xrp, xrp_to_drops, FundedAccount, LedgerError, LedgerGateway, PaymentOutcome,
};

/// XRPL result code for a successful transaction.
const TX_SUCCESS: &str = "tesSUCCESS";

/// Gateway talking to an XRPL JSON-RPC node and its faucet.
pub struct XrplGateway {
    rpc_url: String,
    faucet_url: String,
    policy: FundingPolicy,
    http: Client,
}

impl XrplGateway {
    pub fn new(settings: &Settings) -> Self {
        Self::with_policy(
            settings.rpc_url.clone(),
            settings.faucet_url.clone(),
            settings.funding.clone(),
        )
    }

    pub fn with_policy(rpc_url: String, faucet_url: String, policy: FundingPolicy) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build HTTP client");

        Self {
            rpc_url,
            faucet_url,
            policy,
            http,
        }
    }

    /// Issue one JSON-RPC call and return the `result` object.
    async fn rpc(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({ "method": method, "params": [params] });
        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Rpc(format!("{method} request failed: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(format!("{method} returned invalid JSON: {e}")))?;

        let result = payload
            .get("result")
            .cloned()
            .ok_or_else(|| LedgerError::Rpc(format!("{method} response missing result")))?;

        if result.get("status").and_then(Value::as_str) == Some("error") {
            let code = result
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Err(LedgerError::Rpc(format!("{method} failed: {code}")));
        }

        Ok(result)
    }

    /// Ask the faucet to create and fund a fresh account.
    async fn request_faucet_account(&self) -> Result<FundedAccount, LedgerError> {
        let response = self
            .http
            .post(&self.faucet_url)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| LedgerError::Rpc(format!("faucet request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Rpc(format!(
                "faucet call failed with status {status}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(format!("faucet returned invalid JSON: {e}")))?;

        parse_faucet_account(&payload)
    }

    /// Poll `account_info` until the account shows up in a validated ledger.
    async fn wait_for_funding(&self, address: &str) -> Result<f64, LedgerError> {
        for attempt in 1..=self.policy.poll_attempts {
            match self.account_drops(address).await {
                Ok(drops) => {
                    let balance = drops_to_xrp(drops);
                    info!(address, balance, "wallet active");
                    return Ok(balance);
                }
                Err(reason) => {
                    warn!(
                        address,
                        attempt,
                        max_attempts = self.policy.poll_attempts,
                        reason,
                        "waiting for wallet funding"
                    );
                }
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }

        Err(LedgerError::FundingTimeout {
            address: address.to_string(),
        })
    }

    /// Balance of an account in drops, or the reason the query failed.
    async fn account_drops(&self, address: &str) -> Result<u64, String> {
        let result = self
            .rpc(
                "account_info",
                json!({ "account": address, "ledger_index": "validated" }),
            )
            .await
            .map_err(|e| e.to_string())?;

        parse_balance_drops(&result)
    }

    /// Poll the `tx` method until the transaction is in a validated ledger.
    async fn wait_for_validation(
        &self,
        tx_hash: &str,
        destination: &str,
        amount_xrp: f64,
    ) -> Result<PaymentOutcome, LedgerError> {
        for _ in 0..self.policy.poll_attempts {
            let result = self.rpc("tx", json!({ "transaction": tx_hash })).await;
            if let Ok(result) = result {
                if result.get("validated").and_then(Value::as_bool) == Some(true) {
                    let code = result
                        .pointer("/meta/TransactionResult")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    if code == TX_SUCCESS {
                        return Ok(PaymentOutcome {
                            tx_hash: tx_hash.to_string(),
                            result_code: code.to_string(),
                        });
                    }
                    return Err(LedgerError::PaymentFailed {
                        destination: destination.to_string(),
                        amount_xrp,
                        reason: format!("transaction result {code}"),
                    });
                }
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }

        Err(LedgerError::PaymentFailed {
            destination: destination.to_string(),
            amount_xrp,
            reason: format!("transaction {tx_hash} not validated within confirmation window"),
        })
    }
}

#[async_trait::async_trait]
impl LedgerGateway for XrplGateway {
    async fn create_funded_account(&self) -> Result<FundedAccount, LedgerError> {
        let start = tokio::time::Instant::now();
        let mut delay = self.policy.retry_delay;
        let mut last_reason = String::from("faucet was never reached");

        for attempt in 1..=self.policy.faucet_attempts {
            if start.elapsed() >= self.policy.deadline {
                last_reason = format!(
                    "funding deadline of {:?} exceeded",
                    self.policy.deadline
                );
                break;
            }

            match self.request_faucet_account().await {
                Ok(account) => {
                    info!(address = %account.address, "created testnet wallet");
                    match self.wait_for_funding(&account.address).await {
                        Ok(_) => return Ok(account),
                        Err(e) => {
                            warn!(attempt, error = %e, "funding confirmation failed");
                            last_reason = e.to_string();
                        }
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "faucet attempt failed");
                    last_reason = e.to_string();
                }
            }

            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
        }

        Err(LedgerError::FundingFailed {
            attempts: self.policy.faucet_attempts,
            reason: last_reason,
        })
    }

    async fn balance(&self, address: &str) -> Result<f64, LedgerError> {
        self.account_drops(address)
            .await
            .map(drops_to_xrp)
            .map_err(|reason| LedgerError::BalanceUnavailable {
                address: address.to_string(),
                reason,
            })
    }

    async fn submit_payment(
        &self,
        from: &FundedAccount,
        destination: &str,
        amount_xrp: f64,
    ) -> Result<PaymentOutcome, LedgerError> {
        let drops = xrp_to_drops(amount_xrp);
        let params = json!({
            "secret": from.seed,
            "fail_hard": true,
            "tx_json": {
                "TransactionType": "Payment",
                "Account": from.address,
                "Destination": destination,
                "Amount": drops.to_string(),
            }
        });

        let result = self.rpc("submit", params).await?;

        let engine_result = result
            .get("engine_result")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        if engine_result != TX_SUCCESS {
            return Err(LedgerError::PaymentFailed {
                destination: destination.to_string(),
                amount_xrp,
                reason: format!("engine result {engine_result}"),
            });
        }

        let tx_hash = result
            .pointer("/tx_json/hash")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::Rpc("submit response missing tx hash".to_string()))?
            .to_string();

        info!(tx_hash, destination, amount_xrp, "payment submitted");
        self.wait_for_validation(&tx_hash, destination, amount_xrp)
            .await
    }
}

/// Pull address and seed out of a faucet response. The faucet has shipped
/// both `classicAddress` and `address`, and both `secret` and `seed`.
fn parse_faucet_account(payload: &Value) -> Result<FundedAccount, LedgerError> {
    let account = payload
        .get("account")
        .ok_or_else(|| LedgerError::Rpc("faucet response missing account".to_string()))?;

    let address = account
        .get("classicAddress")
        .or_else(|| account.get("address"))
        .and_then(Value::as_str)
        .ok_or_else(|| LedgerError::Rpc("faucet response missing address".to_string()))?;

    let seed = account
        .get("secret")
        .or_else(|| account.get("seed"))
        .and_then(Value::as_str)
        .ok_or_else(|| LedgerError::Rpc("faucet response missing seed".to_string()))?;

    Ok(FundedAccount {
        address: address.to_string(),
        seed: seed.to_string(),
    })
}

/// Extract the drops balance from an `account_info` result.
fn parse_balance_drops(result: &Value) -> Result<u64, String> {
    let balance = result
        .pointer("/account_data/Balance")
        .and_then(Value::as_str)
        .ok_or_else(|| "account_info result missing Balance".to_string())?;

    balance
        .parse()
        .map_err(|e| format!("Balance '{balance}' is not a drop count: {e}"))
}
