// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types surfaced to the dashboard UI.

use crate::gateway::GatewayError;

/// Reasons a sign-in attempt is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address has not been confirmed")]
    EmailUnconfirmed,
}

/// Reasons a sign-up attempt is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Account created; confirm your email address before signing in")]
    PendingConfirmation,
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Sign in failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Sign up failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Sign out failed: {0}")]
    SignOut(String),

    #[error("Failed to fetch settings: {0}")]
    SettingsFetch(String),

    #[error("Failed to save settings: {0}")]
    SettingsSave(String),

    #[error("Session is invalid: {0}")]
    SessionInvalid(String),

    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Session expired, please sign in again")]
    ReauthenticationRequired,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Check whether the UI should prompt the user to sign in again.
    ///
    /// A restored snapshot can claim a session the provider no longer
    /// honours; the first rejected call lands here.
    pub fn is_reauthentication_required(&self) -> bool {
        matches!(
            self,
            AppError::ReauthenticationRequired
                | AppError::SessionInvalid(_)
                | AppError::NotAuthenticated
        )
    }
}

impl From<GatewayError> for AppError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Unauthorized | GatewayError::NoSession => {
                AppError::ReauthenticationRequired
            }
            other => AppError::Gateway(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(errors.to_string())
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, AppError>;
