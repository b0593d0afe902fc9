// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: who is signed in and what their settings are.
//!
//! The store is the only owner of the user and settings. It:
//! - Restores the last snapshot at construction, before any network call
//! - Fetches the four settings groups concurrently on sign-in, falling back
//!   to defaults per group
//! - Seeds default rows on sign-up
//! - Commits settings updates locally only once every remote write succeeded
//! - Resets to the signed-out default on sign-out
//!
//! State sits behind a lock that is never held across a provider call, so
//! every commit is a single atomic replacement.

use crate::error::{AppError, AuthError, RegistrationError, Result};
use crate::gateway::{AuthenticatedUser, Gateway, GatewayError, IdTokenProvider};
use crate::models::{SessionSnapshot, Settings, SettingsGroup, SettingsPatch, User};
use crate::services::SnapshotStore;
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

#[derive(Debug, Validate)]
struct SignUpForm {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    name: String,
}

#[derive(Debug, Validate)]
struct EmailForm {
    #[validate(email)]
    email: String,
}

/// Process-wide session context.
pub struct SessionStore {
    gateway: Arc<dyn Gateway>,
    snapshots: Arc<dyn SnapshotStore>,
    state: RwLock<SessionSnapshot>,
}

impl SessionStore {
    /// Build the store from the durable snapshot.
    ///
    /// A missing snapshot means signed out. A corrupt one is logged and
    /// treated the same way.
    pub fn hydrate(gateway: Arc<dyn Gateway>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        let restored = match snapshots.load() {
            Ok(Some(snapshot)) => {
                tracing::debug!(
                    is_authenticated = snapshot.is_authenticated,
                    "Restored session snapshot"
                );
                snapshot
            }
            Ok(None) => SessionSnapshot::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable session snapshot");
                SessionSnapshot::default()
            }
        };

        Self {
            gateway,
            snapshots,
            state: RwLock::new(restored),
        }
    }

    /// Current `{user, is_authenticated, settings}` for rendering.
    pub async fn state(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }

    // ─── Authentication ──────────────────────────────────────────

    /// Sign in and load the user's settings.
    ///
    /// Prior state is untouched if authentication fails. Missing or
    /// unreadable settings groups fall back to their defaults and never fail
    /// the sign-in.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let authenticated = self
            .gateway
            .authenticate(email.trim(), password)
            .await
            .map_err(auth_error)?;

        self.complete_sign_in(authenticated).await
    }

    /// Sign in with a Google ID token, obtained by the caller from Google's
    /// own sign-in flow. Settings are loaded exactly as for [`Self::sign_in`].
    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<User> {
        let id_token = id_token.trim();
        if !is_jwt_shaped(id_token) {
            return Err(AppError::InvalidInput(
                "Google ID token is not a JWT".to_string(),
            ));
        }

        let authenticated = self
            .gateway
            .authenticate_with_id_token(IdTokenProvider::Google, id_token)
            .await
            .map_err(auth_error)?;

        self.complete_sign_in(authenticated).await
    }

    /// Register a new account and seed its default settings rows.
    ///
    /// A failed row insert is logged and does not undo the account; sign-in
    /// falls back to defaults for any row that is missing.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<User> {
        let form = SignUpForm {
            email: email.trim().to_string(),
            name: name.trim().to_string(),
        };
        form.validate()?;

        let registration = self
            .gateway
            .register(&form.email, password, &form.name)
            .await
            .map_err(|e| match e {
                GatewayError::EmailTaken => RegistrationError::EmailTaken.into(),
                GatewayError::WeakPassword => RegistrationError::WeakPassword.into(),
                other => AppError::from(other),
            })?;

        if !registration.session_issued {
            tracing::info!(
                user_id = %registration.user_id,
                "Account created, awaiting email confirmation"
            );
            return Err(RegistrationError::PendingConfirmation.into());
        }

        let user = User::new(registration.user_id, form.email, Some(form.name));
        let settings = Settings::default();

        let inserts = SettingsGroup::ALL
            .into_iter()
            .map(|group| self.upsert_group(&user.id, &settings, group));
        let results = join_all(inserts).await;

        for (group, result) in SettingsGroup::ALL.into_iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(
                    user_id = %user.id,
                    group = %group,
                    error = %e,
                    "Failed to create default settings row, account kept"
                );
            }
        }

        self.commit(SessionSnapshot {
            user: Some(user.clone()),
            is_authenticated: true,
            settings,
        })
        .await;

        tracing::info!(user_id = %user.id, "Signed up");
        Ok(user)
    }

    /// End the session.
    ///
    /// Local state is always reset, even when the provider call fails or
    /// there is no provider session to end; the failure is still reported.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.gateway.end_session().await;

        self.commit(SessionSnapshot::default()).await;

        match result {
            Ok(()) => {
                tracing::info!("Signed out");
                Ok(())
            }
            Err(GatewayError::NoSession) => {
                tracing::warn!("No provider session to end, local session cleared");
                Err(AppError::SignOut(
                    "remote session was not ended: no provider session".to_string(),
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider sign-out failed, local session cleared");
                Err(AppError::SignOut(e.to_string()))
            }
        }
    }

    /// Ask the provider to email a password reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let form = EmailForm {
            email: email.trim().to_string(),
        };
        form.validate()?;

        self.gateway.request_password_reset(&form.email).await?;
        tracing::info!("Password reset requested");
        Ok(())
    }

    // ─── Settings ────────────────────────────────────────────────

    /// Save any subset of the settings groups.
    ///
    /// Every present group is written concurrently. Local state changes only
    /// if all writes succeed; otherwise nothing is applied locally and the
    /// call fails. Returns the committed settings.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        let current = self.state().await;
        let user = match (current.is_authenticated, current.user) {
            (true, Some(user)) => user,
            _ => return Err(AppError::NotAuthenticated),
        };

        if !user.has_valid_id() {
            tracing::warn!(user_id = %user.id, "Stored user id is malformed, forcing sign-out");
            if let Err(e) = self.gateway.end_session().await {
                tracing::debug!(error = %e, "Provider sign-out failed during forced sign-out");
            }
            self.commit(SessionSnapshot::default()).await;
            return Err(AppError::SessionInvalid(format!(
                "malformed user id '{}'",
                user.id
            )));
        }

        patch.validate_groups()?;

        let groups = patch.groups();
        if groups.is_empty() {
            return Ok(current.settings);
        }

        let proposed = current.settings.merged(&patch);
        let writes = groups
            .iter()
            .map(|&group| self.upsert_group(&user.id, &proposed, group));
        let results = join_all(writes).await;

        let mut saved = Vec::new();
        let mut failed = Vec::new();
        for (group, result) in groups.into_iter().zip(results) {
            match result {
                Ok(()) => saved.push(group),
                Err(e) => failed.push((group, e)),
            }
        }

        if !failed.is_empty() {
            if !saved.is_empty() {
                // Remote writes are not transactional across tables.
                tracing::warn!(
                    user_id = %user.id,
                    saved = ?saved,
                    "Settings partially saved remotely, local state left unchanged"
                );
            }
            for (group, e) in &failed {
                tracing::error!(user_id = %user.id, group = %group, error = %e, "Settings write failed");
            }

            if failed
                .iter()
                .any(|(_, e)| matches!(e, GatewayError::Unauthorized | GatewayError::NoSession))
            {
                return Err(AppError::ReauthenticationRequired);
            }

            let detail = failed
                .iter()
                .map(|(group, e)| format!("{}: {}", group, e))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::SettingsSave(detail));
        }

        let mut state = self.state.write().await;
        let still_signed_in = state.is_authenticated
            && state.user.as_ref().is_some_and(|u| u.id == user.id);
        if !still_signed_in {
            tracing::warn!(user_id = %user.id, "Session changed while saving settings, discarding");
            return Err(AppError::NotAuthenticated);
        }

        state.settings = state.settings.merged(&patch);
        self.persist(&state);

        tracing::info!(user_id = %user.id, groups = ?saved, "Settings saved");
        Ok(state.settings.clone())
    }

    // ─── Helpers ─────────────────────────────────────────────────

    /// Load settings for a freshly authenticated user and commit them in one
    /// step.
    async fn complete_sign_in(&self, authenticated: AuthenticatedUser) -> Result<User> {
        if !authenticated.email_confirmed {
            tracing::info!(user_id = %authenticated.user_id, "Sign-in refused, email unconfirmed");
            return Err(AuthError::EmailUnconfirmed.into());
        }

        let user = User::new(
            authenticated.user_id,
            authenticated.email,
            authenticated.display_name,
        )
        .with_photo_url(authenticated.photo_url);

        let (general, voice, player, websites) = tokio::join!(
            self.fetch_group(&user.id, SettingsGroup::General),
            self.fetch_group(&user.id, SettingsGroup::Voice),
            self.fetch_group(&user.id, SettingsGroup::Player),
            self.fetch_group(&user.id, SettingsGroup::Websites),
        );

        self.commit(SessionSnapshot {
            user: Some(user.clone()),
            is_authenticated: true,
            settings: Settings {
                general,
                voice,
                player,
                websites,
            },
        })
        .await;

        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Fetch one settings group, falling back to its default on any failure.
    async fn fetch_group<T>(&self, user_id: &str, group: SettingsGroup) -> T
    where
        T: DeserializeOwned + Default,
    {
        let fetched = match self.gateway.fetch_settings_group(user_id, group).await {
            Ok(Some(row)) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| AppError::SettingsFetch(format!("undecodable row: {}", e))),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::SettingsFetch(e.to_string())),
        };

        match fetched {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::debug!(user_id, group = %group, "No settings row, using defaults");
                T::default()
            }
            Err(e) => {
                tracing::warn!(user_id, group = %group, error = %e, "Using default settings");
                T::default()
            }
        }
    }

    /// Write one group of `settings` for `user_id`.
    async fn upsert_group(
        &self,
        user_id: &str,
        settings: &Settings,
        group: SettingsGroup,
    ) -> std::result::Result<(), GatewayError> {
        let data = settings
            .group_data(group)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.gateway
            .upsert_settings_group(user_id, group, data)
            .await
    }

    /// Replace the whole state and persist it.
    async fn commit(&self, next: SessionSnapshot) {
        let mut state = self.state.write().await;
        *state = next;
        self.persist(&state);
    }

    fn persist(&self, snapshot: &SessionSnapshot) {
        if let Err(e) = self.snapshots.save(snapshot) {
            tracing::warn!(error = %e, "Failed to persist session snapshot");
        }
    }
}

fn auth_error(error: GatewayError) -> AppError {
    match error {
        GatewayError::InvalidCredentials => AuthError::InvalidCredentials.into(),
        GatewayError::EmailUnconfirmed => AuthError::EmailUnconfirmed.into(),
        other => AppError::from(other),
    }
}

/// Three non-empty base64url segments.
fn is_jwt_shaped(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=')
        })
}
