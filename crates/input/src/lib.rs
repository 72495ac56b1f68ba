//! Mouse input and the orbit camera controller.
//!
//! # Invariants
//! - Pitch stays inside `[min_pitch, max_pitch]` after every frame.
//! - Moves only steer the camera while the left button is held.

pub mod event;
pub mod orbit;

pub use event::MouseInput;
pub use orbit::{DAMPING, DRAG_SENSITIVITY, IDLE_PITCH_SPEED, OrbitController, WHEEL_DIVISOR};

pub fn crate_info() -> &'static str {
    "godray-input v0.1.0"
}
