// src/canvas/color.rs
//
// Color parsing for scene scripts and config.
// Channels come in as 0-255 integers or "#rgb"/"#rrggbb"/"#rrggbbaa" hex.

use nannou::prelude::*;

/// Builds an `Rgba` from 0-255 channel values.
pub fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Rgba {
    rgba(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    )
}

/// Parses a hex color string. Accepts "#rgb", "#rrggbb" and "#rrggbbaa",
/// with or without the leading '#'.
pub fn parse_hex(value: &str) -> Option<Rgba> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let mut nibbles = hex.chars().map(|c| c.to_digit(16).unwrap_or(0) as u8);
            let r = nibbles.next()?;
            let g = nibbles.next()?;
            let b = nibbles.next()?;
            Some(rgba8(r * 17, g * 17, b * 17, 255))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(rgba8(r, g, b, 255))
        }
        8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
            Some(rgba8(r, g, b, a))
        }
        _ => None,
    }
}
