// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Audio Native Dashboard: settings and history client for the Audio Native embed
//!
//! This crate provides the session/settings store and the audio history feed
//! that back the dashboard, wired to a hosted auth + row storage provider.

pub mod color;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use gateway::Gateway;
use services::{HistoryFeed, SessionStore, SnapshotStore};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: SessionStore,
    pub history: HistoryFeed,
}

impl AppState {
    /// Build the application state, restoring the last session snapshot.
    pub fn new(
        config: Config,
        gateway: Arc<dyn Gateway>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        let session = SessionStore::hydrate(gateway.clone(), snapshots);
        let history = HistoryFeed::new(gateway, config.history_page_size);

        Self {
            config,
            session,
            history,
        }
    }
}
