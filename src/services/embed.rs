// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Copy-paste snippet that embeds the hosted player on a page.

use crate::color::hex_to_rgba;
use crate::error::{AppError, Result};
use crate::models::PlayerSettings;

/// DOM id the player helper script looks for.
pub const PLAYER_ELEMENT_ID: &str = "AudioNativeElevenLabsPlayer";

/// Render the `<iframe>` + helper `<script>` pair for `public_user_id`.
pub fn iframe_snippet(
    player_base_url: &str,
    public_user_id: &str,
    player: &PlayerSettings,
) -> Result<String> {
    let public_user_id = public_user_id.trim();
    if public_user_id.is_empty() {
        return Err(AppError::InvalidInput(
            "public user id must not be empty".to_string(),
        ));
    }

    let text_color = rgba(&player.text_color)?;
    let background_color = rgba(&player.bg_color)?;
    let base = player_base_url.trim_end_matches('/');

    let src = format!(
        "{}/index.html?publicUserId={}&small={}&textColor={}&backgroundColor={}",
        base,
        urlencoding::encode(public_user_id),
        player.small_player,
        urlencoding::encode(&text_color),
        urlencoding::encode(&background_color),
    );

    Ok(format!(
        "<iframe id=\"{}\" width=\"100%\" height=\"90\" frameBorder=\"no\" scrolling=\"no\" src=\"{}\"></iframe>\n\
         <script src=\"{}/audioNativeHelper.js\" type=\"text/javascript\"></script>",
        PLAYER_ELEMENT_ID, src, base
    ))
}

fn rgba(hex: &str) -> Result<String> {
    hex_to_rgba(hex).ok_or_else(|| AppError::InvalidInput(format!("invalid color '{}'", hex)))
}
