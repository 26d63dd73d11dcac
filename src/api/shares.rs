// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{BuySharesRequest, SharePurchase},
    state::AppState,
    storage::StoredShareholding,
};

#[utoipa::path(
    post,
    path = "/buy_shares",
    request_body = BuySharesRequest,
    tag = "Shares",
    responses(
        (status = 200, body = SharePurchase),
        (status = 400, description = "Invalid share count or insufficient buyer funds"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn buy_shares(
    State(state): State<AppState>,
    Json(request): Json<BuySharesRequest>,
) -> Result<Json<SharePurchase>, ApiError> {
    if request.shares_amount < 1 {
        return Err(ApiError::bad_request("shares_amount must be at least 1."));
    }

    let project = state.store.project(&request.project_id)?;
    let total_xrp = request.shares_amount as f64 * project.share_price_xrp;

    // Each demo purchase runs from a fresh faucet-funded buyer wallet.
    let buyer = state.ledger.create_funded_account().await?;
    let buyer_balance = state.ledger.balance(&buyer.address).await?;

    if buyer_balance < total_xrp {
        return Err(ApiError::bad_request(format!(
            "Insufficient funds. Need {total_xrp:.2} XRP but wallet {} only has {buyer_balance:.2} XRP",
            buyer.address
        )));
    }

    let outcome = state
        .ledger
        .submit_payment(&buyer, &project.wallet_address, total_xrp)
        .await?;

    let holding = StoredShareholding {
        id: Uuid::new_v4().to_string(),
        project_id: project.id.clone(),
        holder_wallet_address: buyer.address.clone(),
        shares_amount: request.shares_amount,
        purchase_date: Utc::now(),
    };
    state.store.insert_shareholding(&holding)?;

    info!(
        project_id = %project.id,
        buyer = %buyer.address,
        shares = request.shares_amount,
        xrp_paid = total_xrp,
        tx_hash = %outcome.tx_hash,
        "shares purchased"
    );

    let buyer_final = degrade_to_none(&state, &buyer.address).await;
    let project_final = degrade_to_none(&state, &project.wallet_address).await;

    Ok(Json(SharePurchase {
        buyer_address: buyer.address,
        buyer_seed: buyer.seed,
        shares_amount: request.shares_amount,
        xrp_paid: total_xrp,
        tx_hash: outcome.tx_hash,
        buyer_balance: buyer_final,
        project_balance: project_final,
    }))
}

/// Display-only balance lookup. The purchase is already confirmed at this
/// point, so a failed query must not fail the request.
async fn degrade_to_none(state: &AppState, address: &str) -> Option<f64> {
    match state.ledger.balance(address).await {
        Ok(balance) => Some(balance),
        Err(e) => {
            warn!(address, error = %e, "post-purchase balance unavailable");
            None
        }
    }
}
