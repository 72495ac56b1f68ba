use glam::Mat4;
use std::f32::consts::PI;

/// Perspective projection. Placement comes from a separate view matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub aspect: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            aspect: 800.0 / 600.0,
            fov: PI * 0.25,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(aspect: f32) -> Self {
        Self {
            aspect,
            ..Self::default()
        }
    }

    /// Follow a window resize. Zero-height sizes (minimized) are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, view: Mat4) -> Mat4 {
        self.projection_matrix() * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn default_camera() {
        let cam = PerspectiveCamera::default();
        assert!((cam.aspect - 4.0 / 3.0).abs() < 1e-6);
        let vp = cam.view_projection(Mat4::look_at_rh(Vec3::Z * 15.0, Vec3::ZERO, Vec3::Y));
        // Should produce a valid matrix (no NaN)
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn resize_updates_aspect() {
        let mut cam = PerspectiveCamera::default();
        cam.set_viewport(1920, 1080);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
        cam.set_viewport(0, 0);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn target_projects_to_center() {
        let cam = PerspectiveCamera::default();
        let vp = cam.view_projection(Mat4::look_at_rh(Vec3::new(3.0, 4.0, 5.0), Vec3::ZERO, Vec3::Y));
        let ndc = vp.project_point3(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..1.0).contains(&ndc.z));
    }
}
