// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversions between `#RRGGBBAA` hex colors and CSS `rgba()` strings.
//!
//! The player settings store hex; the hosted player expects `rgba()` in its
//! query string.

/// Whether `value` is `#` followed by exactly eight hex digits.
pub fn is_hex_rgba(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Convert `#RRGGBB` or `#RRGGBBAA` (leading `#` optional) to
/// `rgba(r, g, b, a)` with alpha in `0..=1`.
pub fn hex_to_rgba(hex: &str) -> Option<String> {
    let hex = hex.trim().trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    let a = if hex.len() == 8 {
        f64::from(channel(6)?) / 255.0
    } else {
        1.0
    };

    Some(format!("rgba({}, {}, {}, {})", r, g, b, a))
}

/// Convert `rgba(r, g, b, a)` or `rgb(r, g, b)` to lowercase `#rrggbbaa`.
pub fn rgba_to_hex(rgba: &str) -> Option<String> {
    let rgba = rgba.trim();
    let inner = rgba
        .strip_prefix("rgba(")
        .or_else(|| rgba.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    let a = match parts.get(3) {
        Some(raw) => {
            let alpha = raw.parse::<f64>().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            (alpha * 255.0).round() as u8
        }
        None => 255,
    };

    Some(format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a))
}

/// Accept a color as hex (`#RRGGBB`, `#RRGGBBAA`, `#` optional) or CSS
/// `rgb()`/`rgba()` and return the stored `#rrggbbaa` form.
pub fn normalize_color(input: &str) -> Option<String> {
    let input = input.trim();
    if input.starts_with("rgb") {
        return rgba_to_hex(input);
    }

    let hex = input.trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(format!("#{}ff", hex.to_ascii_lowercase())),
        8 => Some(format!("#{}", hex.to_ascii_lowercase())),
        _ => None,
    }
}
