//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;

/// Default number of history items requested per page.
pub const DEFAULT_HISTORY_PAGE_SIZE: u32 = 20;
/// Upper bound on the history page size accepted by the provider.
pub const MAX_HISTORY_PAGE_SIZE: u32 = 100;

const DEFAULT_STORAGE_DIR: &str = ".audio-native";
const DEFAULT_PLAYER_BASE_URL: &str = "https://elevenlabs.io/player";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted auth + storage project
    pub supabase_url: String,
    /// Public (anon) API key sent with every request
    pub supabase_anon_key: String,
    /// Directory holding the durable session snapshot
    pub storage_dir: PathBuf,
    /// Items requested per history page
    pub history_page_size: u32,
    /// Base URL of the hosted player used in embed snippets
    pub player_base_url: String,
    /// Public user ID embedded in player snippets, if known
    pub public_user_id: Option<String>,
}

impl Config {
    /// Config for testing only.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
            player_base_url: DEFAULT_PLAYER_BASE_URL.to_string(),
            public_user_id: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let history_page_size = match env::var("HISTORY_PAGE_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::Invalid("HISTORY_PAGE_SIZE", raw.clone()))?
                .clamp(1, MAX_HISTORY_PAGE_SIZE),
            Err(_) => DEFAULT_HISTORY_PAGE_SIZE,
        };

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            storage_dir: env::var("DASHBOARD_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_DIR)),
            history_page_size,
            player_base_url: env::var("PLAYER_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_PLAYER_BASE_URL.to_string()),
            public_user_id: env::var("PUBLIC_USER_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
