// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Boundary to the hosted auth + row storage provider.
//!
//! The session store and history feed only talk to the provider through
//! [`Gateway`], so the transport can be swapped (HTTP in production, a
//! scripted fake in tests).

pub mod supabase;

pub use supabase::SupabaseGateway;

use crate::models::{HistoryItem, SettingsGroup};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Table names as constants.
pub mod tables {
    pub const GENERAL_SETTINGS: &str = "general_settings";
    pub const VOICE_SETTINGS: &str = "voice_settings";
    pub const PLAYER_SETTINGS: &str = "player_settings";
    pub const WEBSITE_SETTINGS: &str = "website_settings";
    /// Generated audio, newest first
    pub const AUDIO_HISTORY: &str = "audio_history";
}

/// Identity returned by a successful password sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Avatar from the identity provider, if any
    pub photo_url: Option<String>,
    pub email_confirmed: bool,
}

/// Tokens for the provider-side session.
///
/// Persisted next to the session snapshot so a restarted process can still
/// make authenticated calls and revoke the session on sign-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Third-party identity providers whose ID tokens the provider accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdTokenProvider {
    Google,
}

impl IdTokenProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            IdTokenProvider::Google => "google",
        }
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user_id: String,
    /// False when the account must confirm its email before a session is
    /// granted.
    pub session_issued: bool,
}

/// Errors reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email not confirmed")]
    EmailUnconfirmed,

    #[error("email already registered")]
    EmailTaken,

    #[error("password too weak")]
    WeakPassword,

    #[error("session rejected by provider")]
    Unauthorized,

    #[error("no provider session")]
    NoSession,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Auth and storage operations the dashboard needs from the provider.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Password sign-in.
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, GatewayError>;

    /// Sign in with an ID token issued by a third-party identity provider.
    async fn authenticate_with_id_token(
        &self,
        provider: IdTokenProvider,
        id_token: &str,
    ) -> Result<AuthenticatedUser, GatewayError>;

    /// Create an account.
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Registration, GatewayError>;

    /// End the provider-side session. Fails with
    /// [`GatewayError::NoSession`] when there is no session to end.
    async fn end_session(&self) -> Result<(), GatewayError>;

    /// Send a password reset link to `email`.
    async fn request_password_reset(&self, email: &str) -> Result<(), GatewayError>;

    /// Fetch a user's row for one settings group, `None` if no row exists.
    async fn fetch_settings_group(
        &self,
        user_id: &str,
        group: SettingsGroup,
    ) -> Result<Option<serde_json::Value>, GatewayError>;

    /// Insert or update a user's row for one settings group.
    async fn upsert_settings_group(
        &self,
        user_id: &str,
        group: SettingsGroup,
        data: serde_json::Value,
    ) -> Result<(), GatewayError>;

    /// Fetch one page (1-based) of audio history. An empty page means the
    /// feed is exhausted.
    async fn fetch_history_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<HistoryItem>, GatewayError>;
}
