// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        AllProjects, CreateProjectRequest, DividendView, ProjectCreated, ProjectDetails,
        ProjectView, ShareholdingView,
    },
    state::AppState,
    storage::{ProjectStatus, StoredProject},
};

/// Maximum share price in XRP. Faucet-funded wallets carry only a small
/// testnet balance, so pricier shares would make every purchase fail.
pub const MAX_SHARE_PRICE_XRP: f64 = 1.0;

#[utoipa::path(
    post,
    path = "/create_project",
    request_body = CreateProjectRequest,
    tag = "Projects",
    responses(
        (status = 200, body = ProjectCreated),
        (status = 400, description = "Invalid share price or share count"),
        (status = 409, description = "Project name already exists")
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Json<ProjectCreated>, ApiError> {
    if request.share_price_xrp > MAX_SHARE_PRICE_XRP {
        return Err(ApiError::bad_request(
            "Share price too high for testing. Please use 1 XRP or less per share.",
        ));
    }
    if request.share_price_xrp <= 0.0 {
        return Err(ApiError::bad_request("Share price must be positive."));
    }
    if request.total_shares == 0 {
        return Err(ApiError::bad_request("total_shares must be at least 1."));
    }

    // Cheap duplicate check before burning a faucet wallet; the insert below
    // still enforces uniqueness.
    if state.store.name_taken(&request.name)? {
        return Err(ApiError::conflict(format!(
            "Project name '{}' already exists",
            request.name
        )));
    }

    let wallet = state.ledger.create_funded_account().await?;

    let balance = match state.ledger.balance(&wallet.address).await {
        Ok(balance) => Some(balance),
        Err(e) => {
            warn!(address = %wallet.address, error = %e, "project wallet balance unavailable");
            None
        }
    };

    let project = StoredProject {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        description: request.description,
        location: request.location,
        total_power_kw: request.total_power_kw,
        total_shares: request.total_shares,
        share_price_xrp: request.share_price_xrp,
        wallet_address: wallet.address,
        wallet_seed: wallet.seed,
        status: ProjectStatus::Funding,
        created_at: Utc::now(),
    };
    state.store.create_project(&project)?;

    tracing::info!(project_id = %project.id, name = %project.name, "project created");

    Ok(Json(ProjectCreated {
        project_id: project.id,
        name: project.name,
        wallet_address: project.wallet_address,
        share_price_xrp: project.share_price_xrp,
        total_shares: project.total_shares,
        wallet_balance: balance,
    }))
}

#[utoipa::path(
    get,
    path = "/project/{project_id}",
    params(("project_id" = String, Path, description = "Project identifier")),
    tag = "Projects",
    responses(
        (status = 200, body = ProjectDetails),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectDetails>, ApiError> {
    let project = state.store.project(&project_id)?;

    let balance = match state.ledger.balance(&project.wallet_address).await {
        Ok(balance) => Some(balance),
        Err(e) => {
            warn!(address = %project.wallet_address, error = %e, "project wallet balance unavailable");
            None
        }
    };

    Ok(Json(project_details(&state, &project, balance)?))
}

#[utoipa::path(
    get,
    path = "/get_all_project_info",
    tag = "Projects",
    responses((status = 200, body = AllProjects))
)]
pub async fn get_all_project_info(
    State(state): State<AppState>,
) -> Result<Json<AllProjects>, ApiError> {
    let mut projects = Vec::new();
    for project in state.store.projects()? {
        // No live balance on the bulk listing; one RPC per project would make
        // the dashboard refresh crawl.
        projects.push(project_details(&state, &project, None)?);
    }
    Ok(Json(AllProjects { projects }))
}

fn project_details(
    state: &AppState,
    project: &StoredProject,
    balance: Option<f64>,
) -> Result<ProjectDetails, ApiError> {
    let shareholders = state
        .store
        .shareholdings(&project.id)?
        .iter()
        .map(ShareholdingView::from)
        .collect();
    let dividends = state
        .store
        .dividends(&project.id)?
        .iter()
        .map(DividendView::from)
        .collect();

    Ok(ProjectDetails {
        project: ProjectView::from_stored(project, balance),
        shareholders,
        dividends,
    })
}
