// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AllProjects, BuySharesRequest, CreateProjectRequest, DistributeDividendsRequest,
        DividendDistributionResult, DividendView, HolderPayout, ProjectCreated, ProjectDetails,
        ProjectView, SharePurchase, ShareholdingView,
    },
    state::AppState,
};

pub mod dividends;
pub mod health;
pub mod projects;
pub mod shares;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/create_project", post(projects::create_project))
        .route("/project/{project_id}", get(projects::get_project))
        .route("/get_all_project_info", get(projects::get_all_project_info))
        .route("/buy_shares", post(shares::buy_shares))
        .route("/distribute_dividends", post(dividends::distribute_dividends))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Static marketing page with a fetch-driven demo of the API.
async fn dashboard() -> Html<&'static str> {
    Html(include_str!("../../assets/dashboard.html"))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        projects::create_project,
        projects::get_project,
        projects::get_all_project_info,
        shares::buy_shares,
        dividends::distribute_dividends,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            CreateProjectRequest,
            ProjectCreated,
            ProjectView,
            ProjectDetails,
            AllProjects,
            ShareholdingView,
            BuySharesRequest,
            SharePurchase,
            DividendView,
            DistributeDividendsRequest,
            DividendDistributionResult,
            HolderPayout
        )
    ),
    tags(
        (name = "Projects", description = "Solar-farm project registration and lookup"),
        (name = "Shares", description = "Share purchases settled on the testnet ledger"),
        (name = "Dividends", description = "Proportional dividend distribution"),
        (name = "Health", description = "Service probes")
    )
)]
struct ApiDoc;
