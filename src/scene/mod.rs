// src/scene/mod.rs
// Rhai-hosted scene scripts and their canvas API bindings

pub mod api;
pub mod script;

pub use api::CanvasHandle;
pub use script::SceneScript;
