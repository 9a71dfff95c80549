// src/config/config_load.rs
//
// loading config.toml

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AnimakeError, Result};

use super::config_types::{PathConfig, PlaybackConfig, RenderConfig, StyleConfig, WindowConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub rendering: RenderConfig,
    pub playback: PlaybackConfig,
    pub style: StyleConfig,
    pub paths: PathConfig,
}

impl Config {
    /// Loads config.toml from the executable's directory, falling back to
    /// the working directory, falling back to built-in defaults.
    pub fn load() -> Result<Self> {
        if let Some(config) = Self::load_from_exe_dir()? {
            return config.validated();
        }
        if Path::new("config.toml").exists() {
            let content = fs::read_to_string("config.toml")?;
            return Self::parse(&content)?.validated();
        }
        Config::default().validated()
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AnimakeError::config(e.to_string()))
    }

    fn load_from_exe_dir() -> Result<Option<Self>> {
        let Some(exe_dir) = exe_dir() else {
            return Ok(None);
        };
        let config_path = exe_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&config_path)?;
        Self::parse(&content).map(Some)
    }

    fn validated(self) -> Result<Self> {
        if self.playback.fps == 0 {
            return Err(AnimakeError::config("playback.fps must be at least 1"));
        }
        if self.playback.duration_secs <= 0.0 {
            return Err(AnimakeError::config("playback.duration_secs must be positive"));
        }
        if self.rendering.texture_width % 2 != 0 || self.rendering.texture_height % 2 != 0 {
            // yuv420p output needs even dimensions.
            return Err(AnimakeError::config(
                "rendering.texture_width/texture_height must be even for mp4 export",
            ));
        }
        Ok(self)
    }

    pub fn export_frame_count(&self) -> u32 {
        (self.playback.duration_secs * self.playback.fps as f32).round() as u32
    }

    /// Resolves a configured relative path against the executable's
    /// directory when a file exists there, otherwise against the working
    /// directory.
    pub fn resolve_path(raw: &str) -> PathBuf {
        let raw_path = Path::new(raw);
        if raw_path.is_absolute() {
            return raw_path.to_path_buf();
        }
        if let Some(exe_dir) = exe_dir() {
            let candidate = exe_dir.join(raw_path);
            if candidate.exists() {
                return candidate;
            }
        }
        raw_path.to_path_buf()
    }

    pub fn resolve_scene_path(&self) -> PathBuf {
        Self::resolve_path(&self.paths.scene_file)
    }

    pub fn resolve_output_dir(&self) -> PathBuf {
        let raw_path = Path::new(&self.paths.output_directory);
        if raw_path.is_absolute() {
            return raw_path.to_path_buf();
        }
        // Output lands next to the executable when possible so repeated
        // runs collect in one place.
        match exe_dir() {
            Some(exe_dir) => exe_dir.join(raw_path),
            None => raw_path.to_path_buf(),
        }
    }
}

fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
}
