// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the hosted auth + row storage provider.
//!
//! Handles:
//! - Password and ID-token sign-in, sign-up, sign-out and reset emails
//!   (`/auth/v1`)
//! - Per-group settings rows (`/rest/v1/<table>`), upserted on `user_id`
//! - Paged audio history reads
//! - Keeping the provider session (persisted, refreshed once on 401)
//! - Mapping provider error bodies onto [`GatewayError`]

use super::{
    AuthenticatedUser, Gateway, GatewayError, IdTokenProvider, ProviderSession, Registration,
};
use crate::config::Config;
use crate::gateway::tables;
use crate::models::{HistoryItem, SettingsGroup};
use crate::services::SnapshotStore;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Which bearer a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bearer {
    /// The user's session if there is one, else the anon key
    Any,
    /// The user's session; fail with `NoSession` without one
    Session,
}

/// Provider client.
#[derive(Clone)]
pub struct SupabaseGateway {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Arc<RwLock<Option<ProviderSession>>>,
    store: Option<Arc<dyn SnapshotStore>>,
}

impl SupabaseGateway {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, anon_key: &str) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, anon_key, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        anon_key: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building provider HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: Arc::new(RwLock::new(None)),
            store: None,
        })
    }

    /// Persist the provider session in `store`, restoring any saved one.
    pub fn with_session_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        let restored = match store.load_provider_session() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable provider session");
                None
            }
        };
        tracing::debug!(restored = restored.is_some(), "Provider session loaded");

        self.session = Arc::new(RwLock::new(restored));
        self.store = Some(store);
        self
    }

    /// Create a client from application config, keeping its session in
    /// `store`.
    pub fn from_config(config: &Config, store: Arc<dyn SnapshotStore>) -> anyhow::Result<Self> {
        Ok(Self::new(&config.supabase_url, &config.supabase_anon_key)?.with_session_store(store))
    }

    /// Current provider session, if any.
    pub async fn session(&self) -> Option<ProviderSession> {
        self.session.read().await.clone()
    }

    async fn set_session(&self, session: Option<ProviderSession>) {
        *self.session.write().await = session.clone();
        if let Some(store) = &self.store {
            if let Err(e) = store.save_provider_session(session.as_ref()) {
                tracing::warn!(error = %e, "Failed to persist provider session");
            }
        }
    }

    // ─── Request helpers ─────────────────────────────────────────

    /// Attach the API key and a bearer token. Returns whether the user's
    /// session token was used.
    async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Bearer,
    ) -> Result<(reqwest::RequestBuilder, bool), GatewayError> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone());

        let (token, is_session) = match (token, bearer) {
            (Some(token), _) => (token, true),
            (None, Bearer::Any) => (self.anon_key.clone(), false),
            (None, Bearer::Session) => return Err(GatewayError::NoSession),
        };

        let request = request
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(token);
        Ok((request, is_session))
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Bearer,
    ) -> Result<(reqwest::Response, bool), GatewayError> {
        let (request, is_session) = self.authorize(request, bearer).await?;
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok((response, is_session))
    }

    /// Send a request and turn non-success statuses into gateway errors.
    ///
    /// A 401 on a session-authenticated request refreshes the session once
    /// and retries.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Bearer,
    ) -> Result<reqwest::Response, GatewayError> {
        let retry = request.try_clone();
        let (mut response, is_session) = self.dispatch(request, bearer).await?;

        if response.status() == StatusCode::UNAUTHORIZED && is_session {
            if let Some(retry) = retry {
                if self.refresh_session().await? {
                    response = self.dispatch(retry, bearer).await?.0;
                }
            }
        }

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = classify_error(status, &body);
        tracing::debug!(status, error = %error, "Provider request failed");
        Err(error)
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Bearer,
    ) -> Result<T, GatewayError> {
        self.send(request, bearer)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Trade the refresh token for a new session.
    ///
    /// Returns false when there is nothing to refresh or the provider
    /// refused; a refused refresh drops the stored session.
    async fn refresh_session(&self) -> Result<bool, GatewayError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .and_then(|session| session.refresh_token.clone());
        let Some(refresh_token) = refresh_token else {
            return Ok(false);
        };

        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.anon_key.as_str())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            tracing::info!(
                status = response.status().as_u16(),
                "Provider refused session refresh"
            );
            self.set_session(None).await;
            return Ok(false);
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.set_session(Some(session.provider_session())).await;
        tracing::debug!(user_id = %session.user.id, "Provider session refreshed");
        Ok(true)
    }

    /// Turn a sign-in session into an [`AuthenticatedUser`].
    ///
    /// The session is only kept for confirmed accounts, so a rejected
    /// sign-in never replaces the current one.
    async fn accept_session(&self, session: SessionResponse, email: &str) -> AuthenticatedUser {
        let email_confirmed = session.user.email_confirmed_at.is_some();
        if email_confirmed {
            self.set_session(Some(session.provider_session())).await;
        }

        let user = session.user;
        tracing::info!(user_id = %user.id, email_confirmed, "Provider sign-in succeeded");

        AuthenticatedUser {
            display_name: user.display_name(),
            photo_url: user.photo_url(),
            email_confirmed,
            email: user.email.unwrap_or_else(|| email.to_string()),
            user_id: user.id,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl Gateway for SupabaseGateway {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, GatewayError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let session: SessionResponse = self
            .send_json(
                self.http
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "password")])
                    .json(&body),
                Bearer::Any,
            )
            .await?;

        Ok(self.accept_session(session, email).await)
    }

    async fn authenticate_with_id_token(
        &self,
        provider: IdTokenProvider,
        id_token: &str,
    ) -> Result<AuthenticatedUser, GatewayError> {
        let body = serde_json::json!({
            "provider": provider.as_str(),
            "id_token": id_token,
        });

        let session: SessionResponse = self
            .send_json(
                self.http
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "id_token")])
                    .json(&body),
                Bearer::Any,
            )
            .await?;

        Ok(self.accept_session(session, "").await)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Registration, GatewayError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "name": display_name },
        });

        // With email confirmation enabled the provider returns the bare user
        // object; otherwise it returns a full session.
        let response: serde_json::Value = self
            .send_json(
                self.http.post(self.auth_url("signup")).json(&body),
                Bearer::Any,
            )
            .await?;

        let registration = parse_registration(&response)?;
        if registration.session_issued {
            let session = serde_json::from_value::<ProviderSession>(response)
                .map_err(|e| GatewayError::Decode(e.to_string()))?;
            self.set_session(Some(session)).await;
        }

        tracing::info!(
            user_id = %registration.user_id,
            session_issued = registration.session_issued,
            "Provider registration succeeded"
        );
        Ok(registration)
    }

    async fn end_session(&self) -> Result<(), GatewayError> {
        if self.session.read().await.is_none() {
            return Err(GatewayError::NoSession);
        }

        let result = self
            .send(self.http.post(self.auth_url("logout")), Bearer::Session)
            .await;

        // The tokens are useless to us either way once logout was attempted.
        self.set_session(None).await;
        result.map(|_| ())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), GatewayError> {
        let body = serde_json::json!({ "email": email });
        self.send(
            self.http.post(self.auth_url("recover")).json(&body),
            Bearer::Any,
        )
        .await?;
        Ok(())
    }

    async fn fetch_settings_group(
        &self,
        user_id: &str,
        group: SettingsGroup,
    ) -> Result<Option<serde_json::Value>, GatewayError> {
        let filter = format!("eq.{}", user_id);
        let rows: Vec<serde_json::Value> = self
            .send_json(
                self.http.get(self.table_url(group.table())).query(&[
                    ("user_id", filter.as_str()),
                    ("select", "*"),
                    ("limit", "1"),
                ]),
                Bearer::Session,
            )
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn upsert_settings_group(
        &self,
        user_id: &str,
        group: SettingsGroup,
        data: serde_json::Value,
    ) -> Result<(), GatewayError> {
        let serde_json::Value::Object(mut row) = data else {
            return Err(GatewayError::Decode(format!(
                "{} settings must serialize to an object",
                group
            )));
        };
        row.insert("user_id".to_string(), serde_json::Value::from(user_id));

        self.send(
            self.http
                .post(self.table_url(group.table()))
                .query(&[("on_conflict", "user_id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&row),
            Bearer::Session,
        )
        .await?;
        Ok(())
    }

    async fn fetch_history_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<HistoryItem>, GatewayError> {
        // Pages are 1-based; use checked math so a huge page can't wrap.
        let offset = page
            .saturating_sub(1)
            .checked_mul(page_size)
            .ok_or_else(|| GatewayError::Decode("history page offset overflow".to_string()))?;

        self.send_json(
            self.http
                .get(self.table_url(tables::AUDIO_HISTORY))
                .query(&[
                    ("select", "*".to_string()),
                    ("order", "created_date.desc".to_string()),
                    ("offset", offset.to_string()),
                    ("limit", page_size.to_string()),
                ]),
            Bearer::Any,
        )
        .await
    }
}

// ─── Wire types ──────────────────────────────────────────────

/// Session returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: ProviderUser,
}

impl SessionResponse {
    fn provider_session(&self) -> ProviderSession {
        ProviderSession {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// Auth user object.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    email: Option<String>,
    email_confirmed_at: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl ProviderUser {
    fn display_name(&self) -> Option<String> {
        ["name", "full_name"]
            .iter()
            .find_map(|key| self.user_metadata.get(key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    fn photo_url(&self) -> Option<String> {
        ["avatar_url", "picture"]
            .iter()
            .find_map(|key| self.user_metadata.get(key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }
}

fn parse_registration(response: &serde_json::Value) -> Result<Registration, GatewayError> {
    let session_issued = response.get("access_token").is_some_and(|t| t.is_string());
    let user = if session_issued {
        response.get("user").unwrap_or(&serde_json::Value::Null)
    } else {
        response
    };

    let user_id = user
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| GatewayError::Decode("registration response has no user id".to_string()))?;

    Ok(Registration {
        user_id: user_id.to_string(),
        session_issued,
    })
}

/// Map a provider error response onto a [`GatewayError`].
fn classify_error(status: u16, body: &str) -> GatewayError {
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    let field = |key: &str| {
        parsed
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_lowercase()
    };

    let codes = [field("error_code"), field("error"), field("code")];
    let message = [field("msg"), field("message"), field("error_description")].join(" ");

    if has_code(&codes, &["email_not_confirmed"]) || message.contains("email not confirmed") {
        return GatewayError::EmailUnconfirmed;
    }
    if has_code(&codes, &["invalid_credentials", "invalid_grant"]) {
        return GatewayError::InvalidCredentials;
    }
    if has_code(&codes, &["user_already_exists", "email_exists"])
        || message.contains("already registered")
    {
        return GatewayError::EmailTaken;
    }
    if has_code(&codes, &["weak_password"]) || message.contains("password should be") {
        return GatewayError::WeakPassword;
    }
    if status == 401 {
        return GatewayError::Unauthorized;
    }

    GatewayError::Http {
        status,
        body: body.to_string(),
    }
}

fn has_code(codes: &[String], wanted: &[&str]) -> bool {
    codes.iter().any(|c| wanted.contains(&c.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_auth_errors() {
        assert_eq!(
            classify_error(
                400,
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            ),
            GatewayError::InvalidCredentials
        );
        assert_eq!(
            classify_error(
                400,
                r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#
            ),
            GatewayError::EmailUnconfirmed
        );
        assert_eq!(
            classify_error(422, r#"{"code":422,"error_code":"user_already_exists"}"#),
            GatewayError::EmailTaken
        );
        assert_eq!(
            classify_error(422, r#"{"error_code":"weak_password","msg":"weak"}"#),
            GatewayError::WeakPassword
        );
    }

    #[test]
    fn test_classify_unauthorized_and_fallback() {
        assert_eq!(
            classify_error(401, r#"{"code":"PGRST301","message":"JWT expired"}"#),
            GatewayError::Unauthorized
        );
        assert_eq!(
            classify_error(500, "oops"),
            GatewayError::Http {
                status: 500,
                body: "oops".to_string()
            }
        );
    }

    #[test]
    fn test_parse_registration_shapes() {
        let pending = serde_json::json!({ "id": "u1", "email": "a@b.c" });
        assert_eq!(
            parse_registration(&pending).unwrap(),
            Registration {
                user_id: "u1".to_string(),
                session_issued: false
            }
        );

        let issued = serde_json::json!({ "access_token": "t", "user": { "id": "u2" } });
        assert_eq!(
            parse_registration(&issued).unwrap(),
            Registration {
                user_id: "u2".to_string(),
                session_issued: true
            }
        );

        assert!(parse_registration(&serde_json::json!({})).is_err());
    }

    #[tokio::test]
    async fn test_end_session_without_tokens_reports_no_session() {
        // Nothing listens on the discard port; no request may be attempted.
        let gateway = SupabaseGateway::new("http://127.0.0.1:9", "anon").unwrap();
        assert_eq!(gateway.end_session().await, Err(GatewayError::NoSession));
    }

    #[tokio::test]
    async fn test_session_restored_from_store() {
        let store = Arc::new(crate::services::MemorySnapshotStore::default());
        let saved = ProviderSession {
            access_token: "at-1".to_string(),
            refresh_token: Some("rt-1".to_string()),
        };
        store.save_provider_session(Some(&saved)).unwrap();

        let gateway = SupabaseGateway::from_config(&Config::test_default(), store).unwrap();
        assert_eq!(gateway.session().await, Some(saved));
    }
}
