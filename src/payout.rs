// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Proportional dividend allocation.

use crate::storage::StoredShareholding;

/// One shareholder's slice of a dividend pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Payout {
    pub shareholding_id: String,
    pub holder_address: String,
    pub amount_xrp: f64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayoutError {
    #[error("No shareholders found for this project")]
    NoShareholders,
}

/// Split `total_xrp` across shareholdings in proportion to shares held.
///
/// The empty-input guard is what prevents a division by zero; the arithmetic
/// itself is plain floating point, so the payout sum can differ from the pool
/// by float error. Good enough for a demo, not for production money.
pub fn allocate(
    total_xrp: f64,
    holdings: &[StoredShareholding],
) -> Result<Vec<Payout>, PayoutError> {
    if holdings.is_empty() {
        return Err(PayoutError::NoShareholders);
    }

    let total_shares: u64 = holdings.iter().map(|h| h.shares_amount).sum();

    Ok(holdings
        .iter()
        .map(|holding| Payout {
            shareholding_id: holding.id.clone(),
            holder_address: holding.holder_wallet_address.clone(),
            amount_xrp: (holding.shares_amount as f64 / total_shares as f64) * total_xrp,
        })
        .collect())
}
