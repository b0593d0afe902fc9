// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod history;
pub mod settings;
pub mod user;

pub use history::{HistoryItem, HistoryVoice};
pub use settings::{
    GeneralSettings, PlayerSettings, Settings, SettingsGroup, SettingsPatch, VoiceProvider,
    VoiceSettings, WebsiteSettings,
};
pub use user::{SessionSnapshot, User};
