// src/lib.rs
//
// Animake: a small host for procedural 2D animations. A nannou window
// runs a Rhai scene script once per frame; the script records draw
// commands on a FrameCanvas, which the host replays and can export to
// MP4 through ffmpeg. The scene script hot-reloads while the window is
// open.

pub mod canvas;
pub mod config;
pub mod error;
pub mod scene;
pub mod services;

pub use error::{AnimakeError, Result};
