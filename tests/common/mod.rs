// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use audio_native_dashboard::gateway::{
    AuthenticatedUser, Gateway, GatewayError, IdTokenProvider, Registration,
};
use audio_native_dashboard::models::{HistoryItem, HistoryVoice, SettingsGroup};
use audio_native_dashboard::services::{MemorySnapshotStore, SessionStore};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A well-formed v4 user id.
#[allow(dead_code)]
pub const USER_ID: &str = "0b8a4f5e-5c1d-4b1e-9f3a-2d6c7e8f9a0b";

#[allow(dead_code)]
pub const EMAIL: &str = "sascha@example.com";

#[derive(Default)]
struct FakeState {
    auth: Option<Result<AuthenticatedUser, GatewayError>>,
    id_token_auth: Option<Result<AuthenticatedUser, GatewayError>>,
    id_tokens: Vec<(IdTokenProvider, String)>,
    registration: Option<Result<Registration, GatewayError>>,
    end_session_error: Option<GatewayError>,
    end_session_calls: usize,
    reset_requests: Vec<String>,
    rows: HashMap<(String, SettingsGroup), serde_json::Value>,
    fetch_failures: HashSet<SettingsGroup>,
    upsert_failures: HashMap<SettingsGroup, GatewayError>,
    upserts: Vec<(String, SettingsGroup)>,
    upsert_gate: Option<Arc<Notify>>,
    history_pages: Vec<Vec<HistoryItem>>,
    history_error: Option<GatewayError>,
    history_gate: Option<Arc<Notify>>,
    history_requests: Vec<u32>,
}

/// Scripted in-memory provider.
///
/// Every call yields once before answering so concurrent callers really
/// interleave.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Accept any password for a confirmed `USER_ID` account.
    pub fn with_confirmed_user() -> Arc<Self> {
        let gateway = Self::new();
        gateway.set_auth(Ok(AuthenticatedUser {
            user_id: USER_ID.to_string(),
            email: EMAIL.to_string(),
            display_name: Some("Sascha".to_string()),
            email_confirmed: true,
            photo_url: None,
        }));
        gateway
    }

    pub fn set_auth(&self, result: Result<AuthenticatedUser, GatewayError>) {
        self.lock().auth = Some(result);
    }

    /// Script the result of the next ID-token grants.
    pub fn set_id_token_auth(&self, result: Result<AuthenticatedUser, GatewayError>) {
        self.lock().id_token_auth = Some(result);
    }

    pub fn id_tokens(&self) -> Vec<(IdTokenProvider, String)> {
        self.lock().id_tokens.clone()
    }

    pub fn set_registration(&self, result: Result<Registration, GatewayError>) {
        self.lock().registration = Some(result);
    }

    pub fn fail_end_session(&self, error: GatewayError) {
        self.lock().end_session_error = Some(error);
    }

    pub fn insert_row(&self, user_id: &str, group: SettingsGroup, row: serde_json::Value) {
        self.lock().rows.insert((user_id.to_string(), group), row);
    }

    pub fn row(&self, user_id: &str, group: SettingsGroup) -> Option<serde_json::Value> {
        self.lock().rows.get(&(user_id.to_string(), group)).cloned()
    }

    pub fn fail_fetch(&self, group: SettingsGroup) {
        self.lock().fetch_failures.insert(group);
    }

    pub fn fail_upsert(&self, group: SettingsGroup, error: GatewayError) {
        self.lock().upsert_failures.insert(group, error);
    }

    pub fn clear_upsert_failures(&self) {
        self.lock().upsert_failures.clear();
    }

    pub fn upsert_count(&self) -> usize {
        self.lock().upserts.len()
    }

    /// Hold upserts until the returned gate is notified.
    pub fn gate_upserts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().upsert_gate = Some(gate.clone());
        gate
    }

    pub fn end_session_calls(&self) -> usize {
        self.lock().end_session_calls
    }

    pub fn reset_requests(&self) -> Vec<String> {
        self.lock().reset_requests.clone()
    }

    /// Queue the next history page; pages are served in order.
    pub fn push_history_page(&self, items: Vec<HistoryItem>) {
        self.lock().history_pages.push(items);
    }

    /// Fail the next history request only.
    pub fn fail_next_history(&self, error: GatewayError) {
        self.lock().history_error = Some(error);
    }

    /// Hold history responses until the returned gate is notified.
    pub fn gate_history(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().history_gate = Some(gate.clone());
        gate
    }

    pub fn history_requests(&self) -> Vec<u32> {
        self.lock().history_requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn authenticate(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<AuthenticatedUser, GatewayError> {
        tokio::task::yield_now().await;
        match self.lock().auth.clone() {
            Some(Ok(user)) if user.email == email => Ok(user),
            Some(Ok(_)) | None => Err(GatewayError::InvalidCredentials),
            Some(Err(e)) => Err(e),
        }
    }

    async fn authenticate_with_id_token(
        &self,
        provider: IdTokenProvider,
        id_token: &str,
    ) -> Result<AuthenticatedUser, GatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.id_tokens.push((provider, id_token.to_string()));
        state
            .id_token_auth
            .clone()
            .unwrap_or(Err(GatewayError::InvalidCredentials))
    }

    async fn register(
        &self,
        _email: &str,
        _password: &str,
        _display_name: &str,
    ) -> Result<Registration, GatewayError> {
        tokio::task::yield_now().await;
        self.lock().registration.clone().unwrap_or(Ok(Registration {
            user_id: USER_ID.to_string(),
            session_issued: true,
        }))
    }

    async fn end_session(&self) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.end_session_calls += 1;
        match state.end_session_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        self.lock().reset_requests.push(email.to_string());
        Ok(())
    }

    async fn fetch_settings_group(
        &self,
        user_id: &str,
        group: SettingsGroup,
    ) -> Result<Option<serde_json::Value>, GatewayError> {
        tokio::task::yield_now().await;
        let state = self.lock();
        if state.fetch_failures.contains(&group) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        Ok(state.rows.get(&(user_id.to_string(), group)).cloned())
    }

    async fn upsert_settings_group(
        &self,
        user_id: &str,
        group: SettingsGroup,
        data: serde_json::Value,
    ) -> Result<(), GatewayError> {
        let gate = self.lock().upsert_gate.clone();
        tokio::task::yield_now().await;
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.lock();
        if let Some(e) = state.upsert_failures.get(&group) {
            return Err(e.clone());
        }
        state.upserts.push((user_id.to_string(), group));
        state.rows.insert((user_id.to_string(), group), data);
        Ok(())
    }

    async fn fetch_history_page(
        &self,
        page: u32,
        _page_size: u32,
    ) -> Result<Vec<HistoryItem>, GatewayError> {
        let gate = {
            let mut state = self.lock();
            state.history_requests.push(page);
            state.history_gate.clone()
        };

        tokio::task::yield_now().await;
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.lock();
        if let Some(e) = state.history_error.take() {
            return Err(e);
        }
        Ok(state
            .history_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }
}

/// Build a history item.
#[allow(dead_code)]
pub fn history_item(id: u64, listens: u64, created_date: &str) -> HistoryItem {
    HistoryItem {
        id,
        voice: HistoryVoice {
            name: "Rachel".to_string(),
            code: "EN".to_string(),
        },
        text: format!("Article number {}", id),
        page_url: format!("https://blog.example.com/posts/{}", id),
        audio_url: format!("https://cdn.example.com/audio/{}.mp3", id),
        created_date: created_date.to_string(),
        listens,
    }
}

/// Session store over `gateway` with an empty in-memory snapshot.
#[allow(dead_code)]
pub fn session_store(gateway: Arc<FakeGateway>) -> (SessionStore, Arc<MemorySnapshotStore>) {
    let snapshots = Arc::new(MemorySnapshotStore::default());
    let store = SessionStore::hydrate(gateway, snapshots.clone());
    (store, snapshots)
}

// ─── Scripted HTTP provider ──────────────────────────────────

/// What the scripted server does with one connection.
#[allow(dead_code)]
pub enum Reply {
    Json(u16, serde_json::Value),
    /// Read the request and never answer.
    Hang,
}

/// A request as the scripted server saw it.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request_line: String,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

#[allow(dead_code)]
impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Loopback HTTP server answering each connection with the next scripted
/// reply. Unscripted connections get a 500.
pub struct ScriptedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

#[allow(dead_code)]
impl ScriptedServer {
    pub async fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        let task = tokio::spawn(async move {
            let mut replies = VecDeque::from(replies);
            while let Ok((stream, _)) = listener.accept().await {
                let reply = replies.pop_front();
                tokio::spawn(serve_connection(stream, reply, recorded.clone()));
            }
        });

        Self {
            base_url,
            requests,
            task,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    reply: Option<Reply>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    recorded.lock().unwrap().push(request);

    let (status, body) = match reply {
        Some(Reply::Json(status, body)) => (status, body.to_string()),
        Some(Reply::Hang) => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            return;
        }
        None => (500, r#"{"message":"unscripted request"}"#.to_string()),
    };

    let response = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_lowercase(), value.trim().to_string()))
        .collect();

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        request_line,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}
