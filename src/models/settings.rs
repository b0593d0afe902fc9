// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Embed settings: four independently stored groups.
//!
//! Every group has a fixed default that stands in for a missing row, so a
//! `Settings` value is always complete.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::color::is_hex_rgba;
use crate::gateway::tables;

/// One of the four settings groups, each stored in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsGroup {
    General,
    Voice,
    Player,
    Websites,
}

impl SettingsGroup {
    pub const ALL: [SettingsGroup; 4] = [
        SettingsGroup::General,
        SettingsGroup::Voice,
        SettingsGroup::Player,
        SettingsGroup::Websites,
    ];

    /// Backing table for this group.
    pub fn table(self) -> &'static str {
        match self {
            SettingsGroup::General => tables::GENERAL_SETTINGS,
            SettingsGroup::Voice => tables::VOICE_SETTINGS,
            SettingsGroup::Player => tables::PLAYER_SETTINGS,
            SettingsGroup::Websites => tables::WEBSITE_SETTINGS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SettingsGroup::General => "general",
            SettingsGroup::Voice => "voice",
            SettingsGroup::Player => "player",
            SettingsGroup::Websites => "websites",
        }
    }
}

impl fmt::Display for SettingsGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Groups ──────────────────────────────────────────────────

/// Project-level behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub sessionization: bool,
    pub autoconvert: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            sessionization: false,
            autoconvert: true,
        }
    }
}

/// Text-to-speech vendor used for new projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceProvider {
    #[serde(rename = "11Labs")]
    ElevenLabs,
    #[serde(rename = "OpenAI")]
    OpenAi,
    #[serde(rename = "PlayHT")]
    PlayHt,
    #[serde(rename = "Google")]
    Google,
}

impl VoiceProvider {
    pub const ALL: [VoiceProvider; 4] = [
        VoiceProvider::ElevenLabs,
        VoiceProvider::OpenAi,
        VoiceProvider::PlayHt,
        VoiceProvider::Google,
    ];

    /// Wire name, as stored in the settings row.
    pub fn as_str(self) -> &'static str {
        match self {
            VoiceProvider::ElevenLabs => "11Labs",
            VoiceProvider::OpenAi => "OpenAI",
            VoiceProvider::PlayHt => "PlayHT",
            VoiceProvider::Google => "Google",
        }
    }
}

impl fmt::Display for VoiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceProvider {
    type Err = String;

    /// Case-insensitive wire name; `elevenlabs` is accepted for `11Labs`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("elevenlabs") {
            return Ok(VoiceProvider::ElevenLabs);
        }
        VoiceProvider::ALL
            .into_iter()
            .find(|provider| provider.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown voice provider '{}'", wanted))
    }
}

/// Voice defaults applied when converting a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct VoiceSettings {
    pub autoselect_voice: bool,
    pub voice_provider: VoiceProvider,
    #[validate(length(min = 1))]
    pub language: String,
    #[validate(length(min = 1))]
    pub gender: String,
    #[validate(length(min = 1))]
    pub default_voice: String,
    #[validate(length(min = 1))]
    pub default_model: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            autoselect_voice: true,
            voice_provider: VoiceProvider::ElevenLabs,
            language: "English".to_string(),
            gender: "Male".to_string(),
            default_voice: "Rachel".to_string(),
            default_model: "Eleven Multilingual v2".to_string(),
        }
    }
}

/// Embedded player appearance and controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PlayerSettings {
    pub small_player: bool,
    pub volume_control: bool,
    pub rewind_forward: bool,
    pub speed_control: bool,
    /// `#RRGGBBAA`
    #[validate(custom(function = "validate_hex_color"))]
    pub text_color: String,
    /// `#RRGGBBAA`
    #[validate(custom(function = "validate_hex_color"))]
    pub bg_color: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            small_player: true,
            volume_control: true,
            rewind_forward: true,
            speed_control: true,
            text_color: "#2134c2ff".to_string(),
            bg_color: "#000000ff".to_string(),
        }
    }
}

/// Where the player may appear.
///
/// All three lists are ordered sets: insertion order is kept and entries
/// are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct WebsiteSettings {
    /// URL prefixes the player is allowed on
    #[validate(custom(function = "validate_url_list"))]
    pub allowed_urls: Vec<String>,
    /// Words that block a page when found anywhere in its URL
    #[validate(custom(function = "validate_word_list"))]
    pub disallowed_words: Vec<String>,
    /// Exact URLs the player is blocked on
    #[validate(custom(function = "validate_url_list"))]
    pub disallowed_urls: Vec<String>,
}

impl Default for WebsiteSettings {
    fn default() -> Self {
        Self {
            allowed_urls: vec!["https://elevenlabs.io/blog/".to_string()],
            disallowed_words: vec!["admin".to_string(), "login".to_string()],
            disallowed_urls: Vec::new(),
        }
    }
}

// ─── Aggregate ───────────────────────────────────────────────

/// Complete settings record for a signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub general: GeneralSettings,
    pub voice: VoiceSettings,
    pub player: PlayerSettings,
    pub websites: WebsiteSettings,
}

impl Settings {
    /// Return a copy with every group present in `patch` replaced.
    pub fn merged(&self, patch: &SettingsPatch) -> Settings {
        Settings {
            general: patch.general.clone().unwrap_or_else(|| self.general.clone()),
            voice: patch.voice.clone().unwrap_or_else(|| self.voice.clone()),
            player: patch.player.clone().unwrap_or_else(|| self.player.clone()),
            websites: patch
                .websites
                .clone()
                .unwrap_or_else(|| self.websites.clone()),
        }
    }

    /// Serialized row data for one group.
    pub fn group_data(&self, group: SettingsGroup) -> serde_json::Result<serde_json::Value> {
        match group {
            SettingsGroup::General => serde_json::to_value(&self.general),
            SettingsGroup::Voice => serde_json::to_value(&self.voice),
            SettingsGroup::Player => serde_json::to_value(&self.player),
            SettingsGroup::Websites => serde_json::to_value(&self.websites),
        }
    }
}

/// Partial update: any subset of the four groups, each replaced whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websites: Option<WebsiteSettings>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.groups().is_empty()
    }

    /// Groups present in this patch, in canonical order.
    pub fn groups(&self) -> Vec<SettingsGroup> {
        SettingsGroup::ALL
            .into_iter()
            .filter(|group| match group {
                SettingsGroup::General => self.general.is_some(),
                SettingsGroup::Voice => self.voice.is_some(),
                SettingsGroup::Player => self.player.is_some(),
                SettingsGroup::Websites => self.websites.is_some(),
            })
            .collect()
    }

    /// Validate every group present.
    pub fn validate_groups(&self) -> Result<(), validator::ValidationErrors> {
        if let Some(voice) = &self.voice {
            voice.validate()?;
        }
        if let Some(player) = &self.player {
            player.validate()?;
        }
        if let Some(websites) = &self.websites {
            websites.validate()?;
        }
        Ok(())
    }
}

// ─── Validation helpers ──────────────────────────────────────

/// Whether `url` parses as an absolute URL.
pub fn is_valid_url(url: &str) -> bool {
    reqwest::Url::parse(url).is_ok()
}

fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if is_hex_rgba(value) {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}

fn validate_url_list(urls: &[String]) -> Result<(), ValidationError> {
    if urls.iter().any(|url| !is_valid_url(url)) {
        return Err(ValidationError::new("url"));
    }
    ensure_unique(urls)
}

fn validate_word_list(words: &[String]) -> Result<(), ValidationError> {
    if words.iter().any(|word| word.trim().is_empty()) {
        return Err(ValidationError::new("empty_word"));
    }
    ensure_unique(words)
}

fn ensure_unique(entries: &[String]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    if entries.iter().all(|entry| seen.insert(entry.as_str())) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate"))
    }
}
