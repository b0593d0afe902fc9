// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use audio_native_dashboard::error::AppError;
use audio_native_dashboard::models::WebsiteSettings;
use audio_native_dashboard::services::UrlVerdict;
use validator::Validate;

#[test]
fn test_default_policy() {
    let websites = WebsiteSettings::default();

    assert_eq!(
        websites.check_url("https://elevenlabs.io/blog/new-voices"),
        UrlVerdict::Allowed
    );
    assert_eq!(
        websites.check_url("https://elevenlabs.io/docs/intro"),
        UrlVerdict::Blocked
    );
    assert_eq!(
        websites.check_url("https://elevenlabs.io/blog/Admin-tools"),
        UrlVerdict::Blocked
    );
    assert_eq!(websites.check_url("elevenlabs.io/blog/"), UrlVerdict::Invalid);
    assert_eq!(websites.check_url(""), UrlVerdict::Invalid);
}

#[test]
fn test_exact_disallowed_url() {
    let mut websites = WebsiteSettings::default();
    websites
        .add_disallowed_url("https://elevenlabs.io/blog/private")
        .unwrap();

    assert_eq!(
        websites.check_url("https://elevenlabs.io/blog/private"),
        UrlVerdict::Blocked
    );
    // Exact match only.
    assert_eq!(
        websites.check_url("https://elevenlabs.io/blog/private-beta"),
        UrlVerdict::Allowed
    );
}

#[test]
fn test_editing_keeps_ordered_unique_lists() {
    let mut websites = WebsiteSettings::default();

    assert!(websites.add_allowed_url("https://docs.example.com/").unwrap());
    assert!(!websites.add_allowed_url("https://docs.example.com/").unwrap());
    assert_eq!(
        websites.allowed_urls,
        vec![
            "https://elevenlabs.io/blog/".to_string(),
            "https://docs.example.com/".to_string()
        ]
    );

    assert!(websites.add_disallowed_word("draft").unwrap());
    assert!(!websites.add_disallowed_word("admin").unwrap());
    assert!(matches!(
        websites.add_disallowed_word("  "),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        websites.add_allowed_url("docs.example.com"),
        Err(AppError::InvalidInput(_))
    ));

    assert!(websites.remove_disallowed_word("login"));
    assert!(!websites.remove_disallowed_word("login"));
    assert_eq!(
        websites.disallowed_words,
        vec!["admin".to_string(), "draft".to_string()]
    );
    assert!(websites.remove_allowed_url("https://elevenlabs.io/blog/"));
    assert!(!websites.remove_disallowed_url("https://nowhere.example.com/"));

    assert!(websites.validate().is_ok());
}

#[test]
fn test_verdict_messages() {
    assert_eq!(UrlVerdict::Allowed.to_string(), "URL is allowed");
    assert_eq!(UrlVerdict::Blocked.to_string(), "URL is blocked");
}
