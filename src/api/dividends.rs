// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashSet;

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    ledger::FundedAccount,
    models::{DistributeDividendsRequest, DividendDistributionResult, HolderPayout},
    payout::allocate,
    state::AppState,
    storage::{DividendStatus, StoredDividend, StoredPayout},
};

#[utoipa::path(
    post,
    path = "/distribute_dividends",
    request_body = DistributeDividendsRequest,
    tag = "Dividends",
    responses(
        (status = 200, body = DividendDistributionResult),
        (status = 400, description = "No shareholders, bad amount, or insufficient project funds"),
        (status = 404, description = "Project or dividend not found"),
        (status = 500, description = "A payment failed; the distribution is marked FAILED and can be resumed")
    )
)]
pub async fn distribute_dividends(
    State(state): State<AppState>,
    Json(request): Json<DistributeDividendsRequest>,
) -> Result<Json<DividendDistributionResult>, ApiError> {
    let project = state.store.project(&request.project_id)?;

    let holdings = state.store.shareholdings(&project.id)?;
    if holdings.is_empty() {
        return Err(ApiError::bad_request(
            "No shareholders found for this project",
        ));
    }

    // Either resume an interrupted distribution or open a new one.
    let (dividend, resuming) = match &request.dividend_id {
        Some(dividend_id) => {
            let dividend = state.store.dividend(dividend_id)?;
            if dividend.project_id != project.id {
                return Err(ApiError::bad_request(
                    "Dividend does not belong to this project",
                ));
            }
            if dividend.status == DividendStatus::Completed {
                return Err(ApiError::bad_request(
                    "This distribution is already completed",
                ));
            }
            (dividend, true)
        }
        None => {
            let total = request.total_dividend_xrp.ok_or_else(|| {
                ApiError::bad_request("total_dividend_xrp is required to start a distribution")
            })?;
            if total <= 0.0 {
                return Err(ApiError::bad_request("total_dividend_xrp must be positive"));
            }
            let dividend = StoredDividend {
                id: Uuid::new_v4().to_string(),
                project_id: project.id.clone(),
                amount_xrp: total,
                distribution_date: Utc::now(),
                status: DividendStatus::Processing,
            };
            (dividend, false)
        }
    };

    let payouts =
        allocate(dividend.amount_xrp, &holdings).map_err(|e| ApiError::bad_request(e.to_string()))?;

    // Holders already paid by an earlier attempt are skipped on resume.
    let already_paid: HashSet<String> = if resuming {
        state
            .store
            .payouts(&dividend.id)?
            .into_iter()
            .map(|p| p.shareholding_id)
            .collect()
    } else {
        HashSet::new()
    };
    let unpaid: Vec<_> = payouts
        .iter()
        .filter(|p| !already_paid.contains(&p.shareholding_id))
        .collect();

    if !unpaid.is_empty() {
        let required: f64 = unpaid.iter().map(|p| p.amount_xrp).sum();
        // Checked against the live wallet, not transactionally guaranteed.
        let project_balance = state.ledger.balance(&project.wallet_address).await?;
        if project_balance < required {
            return Err(ApiError::bad_request(format!(
                "Insufficient funds in project wallet. Need {required} XRP but wallet only has {project_balance} XRP"
            )));
        }

        if resuming {
            state
                .store
                .set_dividend_status(&dividend.id, DividendStatus::Processing)?;
        } else {
            state.store.insert_dividend(&dividend)?;
        }

        let project_account = FundedAccount {
            address: project.wallet_address.clone(),
            seed: project.wallet_seed.clone(),
        };

        for payout in &unpaid {
            match state
                .ledger
                .submit_payment(&project_account, &payout.holder_address, payout.amount_xrp)
                .await
            {
                Ok(outcome) => {
                    state.store.record_payout(&StoredPayout {
                        dividend_id: dividend.id.clone(),
                        shareholding_id: payout.shareholding_id.clone(),
                        holder_address: payout.holder_address.clone(),
                        amount_xrp: payout.amount_xrp,
                        tx_hash: Some(outcome.tx_hash),
                        paid_at: Utc::now(),
                    })?;
                }
                Err(e) => {
                    state
                        .store
                        .set_dividend_status(&dividend.id, DividendStatus::Failed)?;
                    warn!(
                        dividend_id = %dividend.id,
                        holder = %payout.holder_address,
                        error = %e,
                        "dividend payment failed; distribution marked FAILED"
                    );
                    return Err(ApiError::internal(format!(
                        "Dividend payment failed: {e}. Distribution {} is marked FAILED; \
                         resubmit with this dividend_id to pay the remaining holders.",
                        dividend.id
                    )));
                }
            }
        }
    }

    state
        .store
        .set_dividend_status(&dividend.id, DividendStatus::Completed)?;

    info!(
        dividend_id = %dividend.id,
        project_id = %project.id,
        amount_xrp = dividend.amount_xrp,
        holders = payouts.len(),
        resumed = resuming,
        "dividend distribution completed"
    );

    let distributions = state
        .store
        .payouts(&dividend.id)?
        .into_iter()
        .map(|p| HolderPayout {
            holder_address: p.holder_address,
            amount_xrp: p.amount_xrp,
            tx_hash: p.tx_hash,
        })
        .collect();

    let project_final_balance = match state.ledger.balance(&project.wallet_address).await {
        Ok(balance) => Some(balance),
        Err(e) => {
            warn!(address = %project.wallet_address, error = %e, "final balance unavailable");
            None
        }
    };

    Ok(Json(DividendDistributionResult {
        dividend_id: dividend.id,
        status: "COMPLETED".into(),
        distributions,
        project_final_balance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::projects::create_project;
    use crate::api::shares::buy_shares;
    use crate::models::{BuySharesRequest, CreateProjectRequest};
    use crate::state::testing::state_with_mock;
    use crate::storage::{ProjectStatus, StoredProject, StoredShareholding};
    use axum::http::StatusCode;

    async fn create_project_with_price(state: &AppState, name: &str, price: f64) -> String {
        let Json(created) = create_project(
            State(state.clone()),
            Json(CreateProjectRequest {
                name: name.into(),
                description: "demo".into(),
                location: "Phoenix, AZ".into(),
                total_power_kw: 1000.0,
                total_shares: 1000,
                share_price_xrp: price,
            }),
        )
        .await
        .expect("project created");
        created.project_id
    }

    fn insert_holding(state: &AppState, project_id: &str, address: &str, shares: u64) -> String {
        let holding = StoredShareholding {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            holder_wallet_address: address.into(),
            shares_amount: shares,
            purchase_date: Utc::now(),
        };
        state.store.insert_shareholding(&holding).unwrap();
        holding.id
    }

    fn start_request(project_id: &str, total: f64) -> DistributeDividendsRequest {
        DistributeDividendsRequest {
            project_id: project_id.into(),
            total_dividend_xrp: Some(total),
            dividend_id: None,
        }
    }

    #[tokio::test]
    async fn end_to_end_single_holder_receives_the_whole_pool() {
        let (state, ledger, _dir) = state_with_mock(100.0);
        let project_id = create_project_with_price(&state, "Test Farm", 0.5).await;

        let Json(purchase) = buy_shares(
            State(state.clone()),
            Json(BuySharesRequest {
                project_id: project_id.clone(),
                shares_amount: 100,
            }),
        )
        .await
        .expect("purchase succeeds");

        let Json(result) = distribute_dividends(
            State(state.clone()),
            Json(start_request(&project_id, 10.0)),
        )
        .await
        .expect("distribution succeeds");

        assert_eq!(result.status, "COMPLETED");
        assert_eq!(result.distributions.len(), 1);
        assert_eq!(result.distributions[0].amount_xrp, 10.0);
        assert_eq!(
            result.distributions[0].holder_address,
            purchase.buyer_address
        );

        // Buyer paid 50 for shares and got 10 back as dividend.
        assert_eq!(ledger.balance_of(&purchase.buyer_address), Some(60.0));

        let dividends = state.store.dividends(&project_id).unwrap();
        assert_eq!(dividends.len(), 1);
        assert_eq!(dividends[0].status, DividendStatus::Completed);
    }

    #[tokio::test]
    async fn pool_splits_thirty_seventy_across_two_holders() {
        let (state, ledger, _dir) = state_with_mock(100.0);
        let project_id = create_project_with_price(&state, "Test Farm", 0.5).await;
        insert_holding(&state, &project_id, "rAlice", 300);
        insert_holding(&state, &project_id, "rBob", 700);

        let Json(result) = distribute_dividends(
            State(state.clone()),
            Json(start_request(&project_id, 100.0)),
        )
        .await
        .expect("distribution succeeds");

        let amounts: Vec<f64> = result.distributions.iter().map(|d| d.amount_xrp).collect();
        assert_eq!(amounts, vec![30.0, 70.0]);
        assert_eq!(ledger.balance_of("rAlice"), Some(30.0));
        assert_eq!(ledger.balance_of("rBob"), Some(70.0));
    }

    #[tokio::test]
    async fn no_shareholders_is_a_bad_request() {
        let (state, _ledger, _dir) = state_with_mock(100.0);
        let project_id = create_project_with_price(&state, "Test Farm", 0.5).await;

        let err = distribute_dividends(
            State(state.clone()),
            Json(start_request(&project_id, 10.0)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("No shareholders"));
        assert!(state.store.dividends(&project_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn underfunded_project_wallet_is_rejected_before_any_payment() {
        let (state, ledger, _dir) = state_with_mock(100.0);
        let project_id = create_project_with_price(&state, "Test Farm", 0.5).await;
        insert_holding(&state, &project_id, "rAlice", 100);

        let project = state.store.project(&project_id).unwrap();
        ledger.set_balance(&project.wallet_address, 5.0);

        let err = distribute_dividends(
            State(state.clone()),
            Json(start_request(&project_id, 10.0)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("Insufficient funds"));
        assert!(state.store.dividends(&project_id).unwrap().is_empty());
        assert_eq!(ledger.balance_of("rAlice"), None);
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let (state, _ledger, _dir) = state_with_mock(100.0);
        let err = distribute_dividends(State(state.clone()), Json(start_request("ghost", 10.0)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_total_on_a_new_distribution_is_rejected() {
        let (state, _ledger, _dir) = state_with_mock(100.0);
        let project_id = create_project_with_price(&state, "Test Farm", 0.5).await;
        insert_holding(&state, &project_id, "rAlice", 100);

        let err = distribute_dividends(
            State(state.clone()),
            Json(DistributeDividendsRequest {
                project_id,
                total_dividend_xrp: None,
                dividend_id: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unavailable_project_balance_surfaces_as_bad_gateway() {
        let (state, _ledger, _dir) = state_with_mock(100.0);

        // A project whose wallet the mock ledger has never seen.
        let project = StoredProject {
            id: Uuid::new_v4().to_string(),
            name: "Orphan Farm".into(),
            description: "demo".into(),
            location: "Nowhere".into(),
            total_power_kw: 1.0,
            total_shares: 10,
            share_price_xrp: 0.1,
            wallet_address: "rUNKNOWN".into(),
            wallet_seed: "sUNKNOWN".into(),
            status: ProjectStatus::Funding,
            created_at: Utc::now(),
        };
        state.store.create_project(&project).unwrap();
        insert_holding(&state, &project.id, "rAlice", 10);

        let err = distribute_dividends(
            State(state.clone()),
            Json(start_request(&project.id, 1.0)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn partial_failure_marks_failed_and_resume_pays_the_rest() {
        let (state, ledger, _dir) = state_with_mock(200.0);
        let project_id = create_project_with_price(&state, "Test Farm", 0.5).await;
        insert_holding(&state, &project_id, "rAlice", 300);
        insert_holding(&state, &project_id, "rBob", 700);

        ledger.fail_payments_to("rBob");

        let err = distribute_dividends(
            State(state.clone()),
            Json(start_request(&project_id, 100.0)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        // The first holder was paid and logged; the record is FAILED, not
        // stuck in PROCESSING.
        let dividends = state.store.dividends(&project_id).unwrap();
        assert_eq!(dividends.len(), 1);
        assert_eq!(dividends[0].status, DividendStatus::Failed);
        let paid = state.store.payouts(&dividends[0].id).unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].holder_address, "rAlice");
        assert_eq!(ledger.balance_of("rAlice"), Some(30.0));

        ledger.clear_payment_failures();

        let Json(result) = distribute_dividends(
            State(state.clone()),
            Json(DistributeDividendsRequest {
                project_id: project_id.clone(),
                total_dividend_xrp: None,
                dividend_id: Some(dividends[0].id.clone()),
            }),
        )
        .await
        .expect("resume succeeds");

        assert_eq!(result.status, "COMPLETED");
        assert_eq!(result.distributions.len(), 2);
        // Alice was not paid twice.
        assert_eq!(ledger.balance_of("rAlice"), Some(30.0));
        assert_eq!(ledger.balance_of("rBob"), Some(70.0));
        assert_eq!(
            state.store.dividend(&dividends[0].id).unwrap().status,
            DividendStatus::Completed
        );
    }

    #[tokio::test]
    async fn resuming_a_completed_distribution_is_rejected() {
        let (state, _ledger, _dir) = state_with_mock(200.0);
        let project_id = create_project_with_price(&state, "Test Farm", 0.5).await;
        insert_holding(&state, &project_id, "rAlice", 100);

        let Json(result) = distribute_dividends(
            State(state.clone()),
            Json(start_request(&project_id, 10.0)),
        )
        .await
        .unwrap();

        let err = distribute_dividends(
            State(state.clone()),
            Json(DistributeDividendsRequest {
                project_id,
                total_dividend_xrp: None,
                dividend_id: Some(result.dividend_id),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("already completed"));
    }
}
