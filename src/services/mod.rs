// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod embed;
pub mod history;
pub mod session;
pub mod settings_edit;
pub mod snapshot;
pub mod url_policy;

pub use history::{HistoryFeed, LoadOutcome, SortDirection, SortField, SortState};
pub use session::SessionStore;
pub use settings_edit::{GeneralEdit, PlayerEdit, SettingsEdit, VoiceEdit};
pub use snapshot::{
    FileSnapshotStore, MemorySnapshotStore, SnapshotStore, PROVIDER_SESSION_NAME, STORAGE_NAME,
};
pub use url_policy::UrlVerdict;
