use anyhow::Result;
use egui::Context as EguiContext;
use glam::Mat4;
use godray_assets::{AssetLibrary, Geometry, LoadState};
use godray_common::{NodeId, Transform};
use godray_input::{MouseInput, OrbitController};
use godray_render_wgpu::PerspectiveCamera;
use godray_scene::{Scene, SphereRng, spawn_random_cubes};
use std::path::PathBuf;
use winit::event::MouseScrollDelta;

pub const BASIC_EFFECT: &str = "effect/Basic.effect";
pub const SCATTERING_EFFECT: &str = "effect/LightScattering/LightScattering.effect";
pub const CUBE_GEOMETRY: &str = "cube";

/// Pixels of trackpad scroll per wheel notch.
const PIXELS_PER_NOTCH: f64 = 40.0;

/// Everything the demo owns apart from GPU resources.
pub struct AppState {
    pub scene: Scene,
    pub meshes: NodeId,
    pub orbit: OrbitController,
    pub camera: PerspectiveCamera,
    pub assets: AssetLibrary,
    pub show_hud: bool,
    rng: SphereRng,
    cube_count: usize,
}

impl AppState {
    pub fn new(
        assets_root: PathBuf,
        seed: u64,
        cube_count: usize,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let mut scene = Scene::new();
        let meshes = scene.add_child(scene.root(), Some("meshes"), Transform::default())?;

        let mut assets = AssetLibrary::new(assets_root);
        assets.queue(SCATTERING_EFFECT).queue(BASIC_EFFECT);
        assets.set_geometry(CUBE_GEOMETRY, Geometry::cube());

        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(width, height);

        Ok(Self {
            scene,
            meshes,
            orbit: OrbitController::default(),
            camera,
            assets,
            show_hud: true,
            rng: SphereRng::new(seed),
            cube_count,
        })
    }

    /// Run the loader; on completion, populate the scene.
    pub fn load_assets(&mut self) -> Result<()> {
        self.assets.load()?;
        self.assets.require_geometry(CUBE_GEOMETRY)?;
        self.assets.require_effect(BASIC_EFFECT)?;
        let ids = spawn_random_cubes(
            &mut self.scene,
            self.meshes,
            &mut self.rng,
            self.cube_count,
            CUBE_GEOMETRY,
            BASIC_EFFECT,
        )?;
        tracing::info!("scene populated with {} cubes", ids.len());
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.assets.state() == LoadState::Complete
    }

    pub fn handle_mouse(&mut self, input: MouseInput) {
        self.orbit.apply(input);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    /// Per-frame camera update. Returns the view-projection to draw with.
    pub fn update(&mut self) -> Mat4 {
        self.orbit.advance();
        self.camera.view_projection(self.orbit.view_matrix())
    }

    pub fn draw_hud(&mut self, ctx: &EguiContext, target_size: Option<(u32, u32)>) {
        if !self.show_hud {
            return;
        }

        let orbit = self.orbit;
        let eye = orbit.eye();
        egui::SidePanel::left("hud")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("God's Ray");
                ui.separator();
                ui.label(format!("Yaw: {:.3}  Pitch: {:.3}", orbit.yaw, orbit.pitch));
                ui.label(format!("Distance: {:.2}", orbit.distance));
                ui.label(format!(
                    "Speed: x={:.4} y={:.4}",
                    orbit.rotation_x_speed, orbit.rotation_y_speed
                ));
                ui.label(format!("Eye: ({:.1}, {:.1}, {:.1})", eye.x, eye.y, eye.z));
                ui.label(if orbit.is_dragging() {
                    "Dragging"
                } else {
                    "Idle spin"
                });
                ui.separator();
                ui.label(format!("Cubes: {}", self.scene.children(self.meshes).len()));
                match target_size {
                    Some((w, h)) => ui.label(format!("Offscreen target: {w}x{h}")),
                    None => ui.label("Assets loading"),
                };
                ui.separator();
                ui.small("LMB drag: orbit | Wheel: zoom | F1: HUD");
            });
    }
}

/// Convert a winit scroll into wheel notches `(h, v)`.
pub fn wheel_notches(delta: MouseScrollDelta) -> (i32, i32) {
    match delta {
        MouseScrollDelta::LineDelta(h, v) => (h.round() as i32, v.round() as i32),
        MouseScrollDelta::PixelDelta(p) => (
            (p.x / PIXELS_PER_NOTCH).round() as i32,
            (p.y / PIXELS_PER_NOTCH).round() as i32,
        ),
    }
}

/// Carries the sub-pixel remainder of raw mouse motion between events so
/// slow drags on high-rate mice still add up to whole pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct MotionAccumulator {
    remainder: (f64, f64),
}

impl MotionAccumulator {
    /// Add a raw delta and return the whole pixels it completes.
    pub fn accumulate(&mut self, delta: (f64, f64)) -> (i32, i32) {
        let x = self.remainder.0 + delta.0;
        let y = self.remainder.1 + delta.1;
        let whole = (x.trunc(), y.trunc());
        self.remainder = (x - whole.0, y - whole.1);
        (whole.0 as i32, whole.1 as i32)
    }
}
