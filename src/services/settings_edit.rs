// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-change settings edits, turned into a [`SettingsPatch`] against
//! the current settings so they can go through
//! [`SessionStore::update_settings`](crate::services::SessionStore::update_settings).

use crate::color::normalize_color;
use crate::error::{AppError, Result};
use crate::models::{Settings, SettingsPatch, VoiceProvider};

/// Player fields to change; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerEdit {
    pub small_player: Option<bool>,
    pub volume_control: Option<bool>,
    pub rewind_forward: Option<bool>,
    pub speed_control: Option<bool>,
    /// Hex or `rgb()`/`rgba()`
    pub text_color: Option<String>,
    /// Hex or `rgb()`/`rgba()`
    pub bg_color: Option<String>,
}

/// Voice default fields to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceEdit {
    pub autoselect_voice: Option<bool>,
    pub voice_provider: Option<VoiceProvider>,
    pub language: Option<String>,
    pub gender: Option<String>,
    pub default_voice: Option<String>,
    pub default_model: Option<String>,
}

/// General fields to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralEdit {
    pub sessionization: Option<bool>,
    pub autoconvert: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEdit {
    AllowUrl(String),
    UnallowUrl(String),
    BlockUrl(String),
    UnblockUrl(String),
    BlockWord(String),
    UnblockWord(String),
    Player(PlayerEdit),
    Voice(VoiceEdit),
    General(GeneralEdit),
}

impl SettingsEdit {
    /// Patch carrying the one group this edit touches, or `None` when the
    /// edit would leave `current` as it is.
    pub fn to_patch(&self, current: &Settings) -> Result<Option<SettingsPatch>> {
        let mut next = current.clone();

        let changed = match self {
            SettingsEdit::AllowUrl(url) => next.websites.add_allowed_url(url)?,
            SettingsEdit::UnallowUrl(url) => next.websites.remove_allowed_url(url),
            SettingsEdit::BlockUrl(url) => next.websites.add_disallowed_url(url)?,
            SettingsEdit::UnblockUrl(url) => next.websites.remove_disallowed_url(url),
            SettingsEdit::BlockWord(word) => next.websites.add_disallowed_word(word)?,
            SettingsEdit::UnblockWord(word) => next.websites.remove_disallowed_word(word),
            SettingsEdit::Player(edit) => {
                let player = &mut next.player;
                set(&mut player.small_player, edit.small_player);
                set(&mut player.volume_control, edit.volume_control);
                set(&mut player.rewind_forward, edit.rewind_forward);
                set(&mut player.speed_control, edit.speed_control);
                set(&mut player.text_color, color(edit.text_color.as_deref())?);
                set(&mut player.bg_color, color(edit.bg_color.as_deref())?);
                next.player != current.player
            }
            SettingsEdit::Voice(edit) => {
                let voice = &mut next.voice;
                set(&mut voice.autoselect_voice, edit.autoselect_voice);
                set(&mut voice.voice_provider, edit.voice_provider);
                set(&mut voice.language, trimmed(&edit.language));
                set(&mut voice.gender, trimmed(&edit.gender));
                set(&mut voice.default_voice, trimmed(&edit.default_voice));
                set(&mut voice.default_model, trimmed(&edit.default_model));
                next.voice != current.voice
            }
            SettingsEdit::General(edit) => {
                set(&mut next.general.sessionization, edit.sessionization);
                set(&mut next.general.autoconvert, edit.autoconvert);
                next.general != current.general
            }
        };

        if !changed {
            return Ok(None);
        }

        let patch = match self {
            SettingsEdit::Player(_) => SettingsPatch {
                player: Some(next.player),
                ..SettingsPatch::default()
            },
            SettingsEdit::Voice(_) => SettingsPatch {
                voice: Some(next.voice),
                ..SettingsPatch::default()
            },
            SettingsEdit::General(_) => SettingsPatch {
                general: Some(next.general),
                ..SettingsPatch::default()
            },
            _ => SettingsPatch {
                websites: Some(next.websites),
                ..SettingsPatch::default()
            },
        };
        Ok(Some(patch))
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_deref().map(|v| v.trim().to_string())
}

fn color(input: Option<&str>) -> Result<Option<String>> {
    input
        .map(|input| {
            normalize_color(input)
                .ok_or_else(|| AppError::InvalidInput(format!("'{}' is not a color", input)))
        })
        .transpose()
}
