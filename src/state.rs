// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::ledger::LedgerGateway;
use crate::storage::ProjectDatabase;

/// Shared application state: the embedded store and the injected ledger
/// gateway. Both are internally synchronized, so handlers clone freely.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ProjectDatabase>,
    pub ledger: Arc<dyn LedgerGateway>,
}

impl AppState {
    pub fn new(store: ProjectDatabase, ledger: Arc<dyn LedgerGateway>) -> Self {
        Self {
            store: Arc::new(store),
            ledger,
        }
    }
}
