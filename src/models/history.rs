// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Generated-audio history model.

use serde::{Deserialize, Serialize};

/// One generated audio file, as returned by the history feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: u64,
    pub voice: HistoryVoice,
    /// Source text that was converted
    pub text: String,
    /// Page the text was taken from
    pub page_url: String,
    /// Generated audio file
    pub audio_url: String,
    /// Creation date (ISO 8601, date or date-time)
    pub created_date: String,
    #[serde(default)]
    pub listens: u64,
}

/// Voice used for an audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryVoice {
    pub name: String,
    /// Language code, e.g. `NP`
    pub code: String,
}

impl HistoryItem {
    /// Case-insensitive match against text, voice name and page URL.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.text.to_lowercase().contains(needle)
            || self.voice.name.to_lowercase().contains(needle)
            || self.page_url.to_lowercase().contains(needle)
    }
}
