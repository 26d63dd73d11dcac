// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation. Stored records live in [`crate::storage`]; the view types
//! here deliberately omit the project wallet seed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{StoredDividend, StoredProject, StoredShareholding};

// =============================================================================
// Projects
// =============================================================================

/// Request to register a new solar-farm project.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    /// Project name, unique across the platform.
    pub name: String,
    pub description: String,
    pub location: String,
    /// Rated output of the plant in kW.
    pub total_power_kw: f64,
    /// Number of shares the project is divided into.
    pub total_shares: u64,
    /// Price of one share in XRP. Capped at 1 XRP so faucet-funded demo
    /// wallets can afford meaningful purchases.
    pub share_price_xrp: f64,
}

/// Response to a successful project creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectCreated {
    pub project_id: String,
    pub name: String,
    pub wallet_address: String,
    pub share_price_xrp: f64,
    pub total_shares: u64,
    /// Starting balance of the custodial wallet, if the ledger answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_balance: Option<f64>,
}

/// A project as returned by read endpoints. Never includes the wallet seed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub total_power_kw: f64,
    pub total_shares: u64,
    pub share_price_xrp: f64,
    pub wallet_address: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    /// Live on-chain balance; absent when the query was skipped or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance_xrp: Option<f64>,
}

impl ProjectView {
    pub fn from_stored(project: &StoredProject, current_balance_xrp: Option<f64>) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            location: project.location.clone(),
            total_power_kw: project.total_power_kw,
            total_shares: project.total_shares,
            share_price_xrp: project.share_price_xrp,
            wallet_address: project.wallet_address.clone(),
            status: format!("{:?}", project.status).to_uppercase(),
            created_at: project.created_at,
            current_balance_xrp,
        }
    }
}

/// Project plus its shareholder and dividend history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectDetails {
    pub project: ProjectView,
    pub shareholders: Vec<ShareholdingView>,
    pub dividends: Vec<DividendView>,
}

/// Listing of every project with nested history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllProjects {
    pub projects: Vec<ProjectDetails>,
}

// =============================================================================
// Shareholdings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareholdingView {
    pub holder_address: String,
    pub shares_amount: u64,
    pub purchase_date: DateTime<Utc>,
}

impl From<&StoredShareholding> for ShareholdingView {
    fn from(holding: &StoredShareholding) -> Self {
        Self {
            holder_address: holding.holder_wallet_address.clone(),
            shares_amount: holding.shares_amount,
            purchase_date: holding.purchase_date,
        }
    }
}

/// Request to buy shares in a project. A fresh faucet-funded buyer wallet is
/// created per purchase; its seed is returned so the demo user can keep it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BuySharesRequest {
    pub project_id: String,
    /// Number of shares to purchase, at least 1.
    pub shares_amount: u64,
}

/// Response to a confirmed share purchase.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SharePurchase {
    pub buyer_address: String,
    pub buyer_seed: String,
    pub shares_amount: u64,
    pub xrp_paid: f64,
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_balance: Option<f64>,
}

// =============================================================================
// Dividends
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DividendView {
    pub id: String,
    pub amount_xrp: f64,
    pub distribution_date: DateTime<Utc>,
    pub status: String,
}

impl From<&StoredDividend> for DividendView {
    fn from(dividend: &StoredDividend) -> Self {
        Self {
            id: dividend.id.clone(),
            amount_xrp: dividend.amount_xrp,
            distribution_date: dividend.distribution_date,
            status: format!("{:?}", dividend.status).to_uppercase(),
        }
    }
}

/// Request to distribute dividends across a project's shareholders.
///
/// Either start a new distribution by giving `total_dividend_xrp`, or resume
/// a failed one by giving its `dividend_id` (the stored amount is reused and
/// only unpaid holders are processed).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DistributeDividendsRequest {
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_dividend_xrp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_id: Option<String>,
}

/// One holder's confirmed payout within a distribution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HolderPayout {
    pub holder_address: String,
    pub amount_xrp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// Response to a completed (or resumed-and-completed) distribution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DividendDistributionResult {
    pub dividend_id: String,
    pub status: String,
    /// Every confirmed payout of this distribution, including ones made by
    /// an earlier partially-failed attempt.
    pub distributions: Vec<HolderPayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_final_balance: Option<f64>,
}
