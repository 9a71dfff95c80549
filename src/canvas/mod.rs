// src/canvas/mod.rs
// The frame canvas: recorded draw commands + paint state,
// replayed onto a nannou Draw by paint.rs

pub mod color;
pub mod frame_canvas;
pub mod paint;

pub use frame_canvas::{DrawCommand, FrameCanvas, Paint};
pub use paint::{render, CanvasMapping};
