//! User model and the persisted session snapshot.

use serde::{Deserialize, Serialize};

use crate::models::Settings;

/// Signed-in user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned identifier (v4 UUID)
    pub id: String,
    /// Email address used to sign in
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar from a third-party identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl User {
    /// Build a user, falling back to the email's local part when the
    /// provider has no display name on record.
    pub fn new(id: String, email: String, display_name: Option<String>) -> Self {
        let name = display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Self {
            id,
            email,
            name,
            photo_url: None,
        }
    }

    pub fn with_photo_url(mut self, photo_url: Option<String>) -> Self {
        self.photo_url = photo_url.filter(|url| !url.trim().is_empty());
        self
    }

    /// Whether the identifier has the provider's required format.
    pub fn has_valid_id(&self) -> bool {
        is_valid_user_id(&self.id)
    }
}

/// Check that an identifier is a version-4 RFC 4122 UUID.
pub fn is_valid_user_id(id: &str) -> bool {
    match uuid::Uuid::parse_str(id) {
        Ok(parsed) => {
            // parse_str also accepts simple/braced/urn forms; the provider
            // only ever hands out hyphenated ones.
            id.len() == 36
                && parsed.get_version_num() == 4
                && parsed.get_variant() == uuid::Variant::RFC4122
        }
        Err(_) => false,
    }
}

/// Everything the dashboard persists between reloads.
///
/// Stored verbatim under the `auth-storage` key and restored before any
/// network round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub is_authenticated: bool,
    #[serde(default)]
    pub settings: Settings,
}
