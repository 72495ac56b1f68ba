use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node in the scene tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines and debug output.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Translation followed by a uniform scale, i.e. `translate(p) * scale(s)`.
    pub fn from_translation_scale(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            scale: Vec3::splat(scale),
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Linear RGBA color with channels nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub Vec4);

impl Color {
    pub const WHITE: Color = Color(Vec4::ONE);

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self(Vec4::new(r, g, b, a))
    }

    pub fn from_rgb(rgb: Vec3, alpha: f32) -> Self {
        Self(rgb.extend(alpha))
    }

    pub fn to_array(self) -> [f32; 4] {
        self.0.to_array()
    }

    /// True when every channel lies in `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        self.0.to_array().iter().all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
