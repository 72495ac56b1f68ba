//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Render state derives from the scene and a view.
//!
//! The GPU backend lives in `godray-render-wgpu`. The text renderer here is
//! what headless tooling and tests use.

mod renderer;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "godray-render v0.1.0"
}
