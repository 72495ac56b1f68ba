use crate::event::MouseInput;
use glam::{Mat4, Vec3};
use std::f32::consts::PI;

/// Pitch velocity restored when a drag ends, giving a slow idle spin.
pub const IDLE_PITCH_SPEED: f32 = 0.005;
/// Per-frame multiplier applied to both angular velocities.
pub const DAMPING: f32 = 0.9;
/// Radians of velocity per pixel of drag.
pub const DRAG_SENSITIVITY: f32 = 0.0025;
/// Wheel notches per unit of distance.
pub const WHEEL_DIVISOR: f32 = 10.0;

/// Orbit camera driven by damped angular velocities.
///
/// The eye sits on a sphere of radius `distance` around `look_at`; `pitch`
/// is measured from the +Y axis and `yaw` around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitController {
    pub yaw: f32,
    pub pitch: f32,
    /// Pitch velocity (radians per frame).
    pub rotation_x_speed: f32,
    /// Yaw velocity (radians per frame).
    pub rotation_y_speed: f32,
    pub distance: f32,
    pub look_at: Vec3,
    pub min_pitch: f32,
    pub max_pitch: f32,
    drag_connected: bool,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            yaw: -4.03,
            pitch: 2.05,
            rotation_x_speed: IDLE_PITCH_SPEED,
            rotation_y_speed: 0.0,
            distance: 15.0,
            look_at: Vec3::ZERO,
            min_pitch: 1e-5,
            max_pitch: PI - 1e-5,
            drag_connected: false,
        }
    }
}

impl OrbitController {
    pub fn apply(&mut self, input: MouseInput) {
        match input {
            MouseInput::LeftButtonDown => self.on_left_button_down(),
            MouseInput::LeftButtonUp => self.on_left_button_up(),
            MouseInput::Move { dx, dy } => self.on_move(dx, dy),
            MouseInput::Wheel { v, .. } => self.on_wheel(v),
        }
    }

    pub fn on_wheel(&mut self, v: i32) {
        self.distance += v as f32 / WHEEL_DIVISOR;
    }

    /// Connect the drag handler. Subsequent moves set the angular velocities.
    pub fn on_left_button_down(&mut self) {
        if !self.drag_connected {
            tracing::trace!("orbit drag connected");
        }
        self.drag_connected = true;
    }

    /// Disconnect the drag handler and resume the idle spin.
    pub fn on_left_button_up(&mut self) {
        self.drag_connected = false;
        self.rotation_x_speed = IDLE_PITCH_SPEED;
    }

    /// Moves only take effect while the drag handler is connected.
    pub fn on_move(&mut self, dx: i32, dy: i32) {
        if !self.drag_connected {
            return;
        }
        self.rotation_y_speed = dx as f32 * DRAG_SENSITIVITY;
        self.rotation_x_speed = dy as f32 * -DRAG_SENSITIVITY;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_connected
    }

    /// Advance one frame: integrate and damp both velocities, then clamp pitch.
    pub fn advance(&mut self) {
        self.yaw += self.rotation_y_speed;
        self.rotation_y_speed *= DAMPING;

        self.pitch += self.rotation_x_speed;
        self.rotation_x_speed *= DAMPING;

        self.pitch = self.pitch.clamp(self.min_pitch, self.max_pitch);
    }

    /// Unit vector from `look_at` toward the eye.
    fn direction(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(
            self.yaw.cos() * sin_pitch,
            cos_pitch,
            self.yaw.sin() * sin_pitch,
        )
    }

    pub fn eye(&self) -> Vec3 {
        self.look_at + self.distance * self.direction()
    }

    /// Zooming all the way in collapses the eye onto the target; the view then
    /// keeps the orbit's facing instead of degenerating.
    pub fn view_matrix(&self) -> Mat4 {
        if self.distance.abs() <= f32::EPSILON {
            return Mat4::look_to_rh(self.look_at, -self.direction(), Vec3::Y);
        }
        Mat4::look_at_rh(self.eye(), self.look_at, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still() -> OrbitController {
        OrbitController {
            rotation_x_speed: 0.0,
            ..OrbitController::default()
        }
    }

    #[test]
    fn wheel_adjusts_distance_by_tenths() {
        for v in [-120, -7, -1, 0, 1, 3, 250] {
            let mut orbit = OrbitController::default();
            let before = orbit.distance;
            orbit.apply(MouseInput::Wheel { h: 5, v });
            assert!((orbit.distance - (before + v as f32 / 10.0)).abs() < 1e-5);
        }
    }

    #[test]
    fn pitch_stays_clamped() {
        for speed in [-1000.0, -3.0, -0.01, 0.01, 3.0, 1000.0] {
            let mut orbit = OrbitController {
                rotation_x_speed: speed,
                ..OrbitController::default()
            };
            for _ in 0..200 {
                orbit.advance();
                assert!(orbit.pitch >= orbit.min_pitch);
                assert!(orbit.pitch <= orbit.max_pitch);
            }
        }
    }

    #[test]
    fn velocities_decay_geometrically() {
        let mut orbit = OrbitController {
            rotation_x_speed: 0.2,
            rotation_y_speed: -0.4,
            pitch: PI / 2.0,
            ..OrbitController::default()
        };
        for n in 1..=30 {
            orbit.advance();
            let factor = DAMPING.powi(n);
            assert!((orbit.rotation_x_speed - 0.2 * factor).abs() < 1e-6);
            assert!((orbit.rotation_y_speed + 0.4 * factor).abs() < 1e-6);
        }
    }

    #[test]
    fn moves_ignored_until_button_down() {
        let mut orbit = still();
        orbit.apply(MouseInput::Move { dx: 40, dy: 40 });
        assert_eq!(orbit.rotation_y_speed, 0.0);
        assert_eq!(orbit.rotation_x_speed, 0.0);

        orbit.apply(MouseInput::LeftButtonDown);
        assert!(orbit.is_dragging());
        orbit.apply(MouseInput::Move { dx: 40, dy: 20 });
        assert!((orbit.rotation_y_speed - 0.1).abs() < 1e-6);
        assert!((orbit.rotation_x_speed + 0.05).abs() < 1e-6);
    }

    #[test]
    fn release_disconnects_and_resets_pitch_speed() {
        let mut orbit = still();
        orbit.apply(MouseInput::LeftButtonDown);
        orbit.apply(MouseInput::Move { dx: -8, dy: 100 });
        orbit.apply(MouseInput::LeftButtonUp);
        assert!(!orbit.is_dragging());
        assert_eq!(orbit.rotation_x_speed, IDLE_PITCH_SPEED);
        // Yaw velocity is left to decay on its own
        assert!((orbit.rotation_y_speed + 0.02).abs() < 1e-6);

        orbit.apply(MouseInput::Move { dx: 500, dy: 500 });
        assert_eq!(orbit.rotation_x_speed, IDLE_PITCH_SPEED);
    }

    #[test]
    fn eye_is_distance_from_target() {
        let mut orbit = OrbitController::default();
        for _ in 0..50 {
            orbit.advance();
            assert!((orbit.eye().distance(orbit.look_at) - orbit.distance).abs() < 1e-4);
        }
    }

    #[test]
    fn eye_on_equator_at_yaw_zero() {
        let orbit = OrbitController {
            yaw: 0.0,
            pitch: PI / 2.0,
            distance: 10.0,
            ..still()
        };
        assert!((orbit.eye() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
        // The look-at target sits straight ahead
        let target_in_view = orbit.view_matrix().transform_point3(orbit.look_at);
        assert!(target_in_view.x.abs() < 1e-4 && target_in_view.y.abs() < 1e-4);
        assert!(target_in_view.z < 0.0);
    }

    #[test]
    fn zero_distance_view_stays_finite() {
        let mut orbit = OrbitController {
            distance: 1.0,
            ..still()
        };
        orbit.apply(MouseInput::Wheel { h: 0, v: -10 });
        assert_eq!(orbit.distance, 0.0);
        let view = orbit.view_matrix();
        assert!(view.is_finite());

        // Same facing as a camera just outside the target
        let near = OrbitController {
            distance: 1e-3,
            ..orbit
        };
        let a = view.transform_vector3(Vec3::Z);
        let b = near.view_matrix().transform_vector3(Vec3::Z);
        assert!((a - b).length() < 1e-3);
    }
}
