//! wgpu render backend for the god's ray demo.
//!
//! Two passes per frame: surfaces are drawn as instanced geometry into a
//! power-of-two offscreen target, then a full-screen light scattering pass
//! samples that target and writes to the window surface.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - The offscreen target clears to alpha 0; occluders write alpha 1.

mod camera;
mod gpu;
mod post;
mod target;

pub use camera::PerspectiveCamera;
pub use gpu::{SceneRenderer, clear};
pub use post::{LightScatteringPass, ScatteringParams, light_screen_position, light_visibility};
pub use target::{DEPTH_FORMAT, RenderTarget, TARGET_FORMAT, target_extent};
