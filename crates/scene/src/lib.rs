//! Scene: node tree, surfaces, and the random cube population.
//!
//! # Invariants
//! - All mutations flow through explicit operations and are logged.
//! - Children keep insertion order; surface traversal is depth-first.
//! - Population is reproducible for a given seed.

pub mod rng;
pub mod scene;
pub mod spawn;

pub use rng::SphereRng;
pub use scene::{BasicMaterial, Node, Scene, SceneError, SceneEvent, Surface};
pub use spawn::{CUBE_SCALE, SPAWN_RADIUS, spawn_random_cubes};
