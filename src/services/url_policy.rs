// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Where the player may appear: URL checks and list editing on
//! [`WebsiteSettings`].

use crate::error::{AppError, Result};
use crate::models::settings::is_valid_url;
use crate::models::WebsiteSettings;
use std::fmt;

/// Result of testing a page URL against the website settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlVerdict {
    Allowed,
    Blocked,
    /// Not an absolute URL
    Invalid,
}

impl fmt::Display for UrlVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UrlVerdict::Allowed => "URL is allowed",
            UrlVerdict::Blocked => "URL is blocked",
            UrlVerdict::Invalid => "Please enter a valid URL",
        })
    }
}

impl WebsiteSettings {
    /// Test whether the player would load on `url`.
    ///
    /// A URL is allowed when it starts with an allowed prefix, contains no
    /// disallowed word (case-insensitive), and is not itself a disallowed
    /// URL.
    pub fn check_url(&self, url: &str) -> UrlVerdict {
        let url = url.trim();
        if url.is_empty() || !is_valid_url(url) {
            return UrlVerdict::Invalid;
        }

        let lowered = url.to_lowercase();
        let allowed = self.allowed_urls.iter().any(|prefix| url.starts_with(prefix));
        let has_word = self
            .disallowed_words
            .iter()
            .any(|word| lowered.contains(&word.to_lowercase()));
        let listed = self.disallowed_urls.iter().any(|blocked| blocked == url);

        if allowed && !has_word && !listed {
            UrlVerdict::Allowed
        } else {
            UrlVerdict::Blocked
        }
    }

    /// Add an allowed URL prefix. Returns false if it was already present.
    pub fn add_allowed_url(&mut self, url: &str) -> Result<bool> {
        let url = require_url(url)?;
        Ok(insert_unique(&mut self.allowed_urls, url))
    }

    /// Add an exact URL to block. Returns false if it was already present.
    pub fn add_disallowed_url(&mut self, url: &str) -> Result<bool> {
        let url = require_url(url)?;
        Ok(insert_unique(&mut self.disallowed_urls, url))
    }

    /// Add a blocking word. Returns false if it was already present.
    pub fn add_disallowed_word(&mut self, word: &str) -> Result<bool> {
        let word = word.trim();
        if word.is_empty() {
            return Err(AppError::InvalidInput("word must not be empty".to_string()));
        }
        Ok(insert_unique(&mut self.disallowed_words, word.to_string()))
    }

    pub fn remove_allowed_url(&mut self, url: &str) -> bool {
        remove_value(&mut self.allowed_urls, url)
    }

    pub fn remove_disallowed_url(&mut self, url: &str) -> bool {
        remove_value(&mut self.disallowed_urls, url)
    }

    pub fn remove_disallowed_word(&mut self, word: &str) -> bool {
        remove_value(&mut self.disallowed_words, word)
    }
}

fn require_url(url: &str) -> Result<String> {
    let url = url.trim();
    if is_valid_url(url) {
        Ok(url.to_string())
    } else {
        Err(AppError::InvalidInput(format!("'{}' is not a valid URL", url)))
    }
}

fn insert_unique(entries: &mut Vec<String>, value: String) -> bool {
    if entries.contains(&value) {
        return false;
    }
    entries.push(value);
    true
}

fn remove_value(entries: &mut Vec<String>, value: &str) -> bool {
    let before = entries.len();
    entries.retain(|entry| entry != value.trim());
    entries.len() < before
}
