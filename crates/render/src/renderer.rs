use glam::Vec3;
use godray_scene::Scene;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 15.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
        }
    }
}

impl RenderView {
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        Self {
            eye,
            target,
            ..Self::default()
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable listing of the scene as seen from a view.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Cap on listed surfaces; `None` lists all of them.
    pub max_surfaces: Option<usize>,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_surfaces: usize) -> Self {
        Self {
            max_surfaces: Some(max_surfaces),
        }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        let surfaces = scene.surfaces();
        let mut out = String::new();
        out.push_str(&format!(
            "=== Scene (nodes={}, surfaces={}) ===\n",
            scene.node_count(),
            surfaces.len()
        ));
        out.push_str(&format!(
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.1}, {:.1}, {:.1}) dist={:.2} fov={:.0}\n",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.eye.distance(view.target),
            view.fov_degrees
        ));

        let limit = self.max_surfaces.unwrap_or(usize::MAX);
        for (id, world, surface) in surfaces.iter().take(limit) {
            let p = world.transform_point3(Vec3::ZERO);
            let c = surface.material.diffuse_color.to_array();
            out.push_str(&format!(
                "  [{}] {} pos=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2})\n",
                id.short(),
                surface.geometry,
                p.x,
                p.y,
                p.z,
                c[0],
                c[1],
                c[2]
            ));
        }
        if surfaces.len() > limit {
            out.push_str(&format!("  ... {} more\n", surfaces.len() - limit));
        }

        out
    }
}
