// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Solar Crowdfund - Solar Farm Crowdfunding Demo Service
//!
//! A demonstration platform that tokenizes contributions to solar-farm
//! projects and distributes dividends over the XRP Ledger test network.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and the demo dashboard
//! - `ledger` - XRPL testnet gateway (faucet funding, balances, payments)
//! - `payout` - Proportional dividend allocation
//! - `storage` - Embedded project/shareholding/dividend store (redb)

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod payout;
pub mod state;
pub mod storage;
