// src/config/config_types.rs
//
// Config types for the app

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub texture_width: u32,
    pub texture_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            texture_width: 800,
            texture_height: 800,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Frames per second for both live playback and export.
    pub fps: u32,
    /// Export length in seconds.
    pub duration_secs: f32,
    /// When true the canvas origin sits at the canvas center.
    pub centered: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            duration_secs: 5.0,
            centered: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Background color as a hex string ("#fff", "#rrggbb", "#rrggbbaa").
    pub background: String,
    pub default_stroke_weight: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: "#fff".to_string(),
            default_stroke_weight: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub scene_file: String,
    pub output_directory: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            scene_file: "scenes/example.rhai".to_string(),
            output_directory: "output".to_string(),
        }
    }
}
