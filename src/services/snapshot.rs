// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable session snapshot storage.
//!
//! One key-value entry, named [`STORAGE_NAME`], holds the serialized
//! `{user, is_authenticated, settings}` snapshot. It is read once at
//! startup, before any network round-trip.
//!
//! A sibling entry, [`PROVIDER_SESSION_NAME`], holds the provider's access
//! and refresh tokens. It is kept apart so the snapshot stays exactly what
//! the UI renders.

use crate::error::AppError;
use crate::gateway::ProviderSession;
use crate::models::SessionSnapshot;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fixed storage name of the snapshot entry.
pub const STORAGE_NAME: &str = "auth-storage";
/// Storage name of the provider token entry.
pub const PROVIDER_SESSION_NAME: &str = "auth-token";

/// Somewhere a session snapshot can survive a restart.
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot, `None` if nothing was stored yet.
    fn load(&self) -> Result<Option<SessionSnapshot>, AppError>;

    /// Replace the stored snapshot.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), AppError>;

    /// Load the provider tokens, `None` if there is no provider session.
    fn load_provider_session(&self) -> Result<Option<ProviderSession>, AppError>;

    /// Replace the provider tokens. `None` removes them.
    fn save_provider_session(&self, session: Option<&ProviderSession>) -> Result<(), AppError>;
}

/// Snapshot kept as `<dir>/auth-storage.json`, tokens as
/// `<dir>/auth-token.json`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
    token_path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", STORAGE_NAME)),
            token_path: dir.as_ref().join(format!("{}.json", PROVIDER_SESSION_NAME)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<SessionSnapshot>, AppError> {
        read_json(&self.path, "session snapshot")
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), AppError> {
        write_json(&self.path, snapshot)
    }

    fn load_provider_session(&self) -> Result<Option<ProviderSession>, AppError> {
        read_json(&self.token_path, "provider session")
    }

    fn save_provider_session(&self, session: Option<&ProviderSession>) -> Result<(), AppError> {
        match session {
            Some(session) => write_json(&self.token_path, session),
            None => match fs::remove_file(&self.token_path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(AppError::Storage(format!(
                    "Failed to remove {}: {}",
                    self.token_path.display(),
                    e
                ))),
            },
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Option<T>, AppError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| AppError::Storage(format!("Corrupt {}: {}", what, e)))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;
    }

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", path.display(), e)))?;

    // Write-then-rename so a crash never leaves a half-written file.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .and_then(|_| restrict_permissions(&tmp))
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", path.display(), e)))
}

/// Tokens are bearer credentials; keep them owner-only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// In-process snapshot store for ephemeral sessions and tests.
///
/// Holds the serialized form so loads go through the same decoding as the
/// file store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<String>>,
    provider_session: Mutex<Option<ProviderSession>>,
}

impl MemorySnapshotStore {
    /// Seed the store with raw snapshot text.
    pub fn with_raw(raw: &str) -> Self {
        Self {
            slot: Mutex::new(Some(raw.to_string())),
            provider_session: Mutex::new(None),
        }
    }

    /// Raw stored text, if any.
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<SessionSnapshot>, AppError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| AppError::Storage("Snapshot lock poisoned".to_string()))?;

        slot.as_deref()
            .map(serde_json::from_str::<SessionSnapshot>)
            .transpose()
            .map_err(|e| AppError::Storage(format!("Corrupt session snapshot: {}", e)))
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), AppError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| AppError::Storage(format!("Failed to encode snapshot: {}", e)))?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| AppError::Storage("Snapshot lock poisoned".to_string()))?;
        *slot = Some(json);
        Ok(())
    }

    fn load_provider_session(&self) -> Result<Option<ProviderSession>, AppError> {
        self.provider_session
            .lock()
            .map(|session| session.clone())
            .map_err(|_| AppError::Storage("Provider session lock poisoned".to_string()))
    }

    fn save_provider_session(&self, session: Option<&ProviderSession>) -> Result<(), AppError> {
        let mut slot = self
            .provider_session
            .lock()
            .map_err(|_| AppError::Storage("Provider session lock poisoned".to_string()))?;
        *slot = session.cloned();
        Ok(())
    }
}
