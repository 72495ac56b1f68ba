use crate::rng::SphereRng;
use crate::scene::{BasicMaterial, Scene, SceneError, Surface};
use godray_common::{Color, NodeId, Transform};

/// Radius of the sphere cubes are scattered on.
pub const SPAWN_RADIUS: f32 = 50.0;
/// Uniform scale applied to the unit cube geometry.
pub const CUBE_SCALE: f32 = 10.0;

/// Add `count` cubes under `parent`, each placed on a random point of the
/// spawn sphere and colored by that point's direction remapped to `[0, 1]`.
pub fn spawn_random_cubes(
    scene: &mut Scene,
    parent: NodeId,
    rng: &mut SphereRng,
    count: usize,
    geometry: &str,
    effect: &str,
) -> Result<Vec<NodeId>, SceneError> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let r = rng.unit_sphere();
        let id = scene.add_child(
            parent,
            None,
            Transform::from_translation_scale(r * SPAWN_RADIUS, CUBE_SCALE),
        )?;
        scene.add_surface(
            id,
            Surface {
                geometry: geometry.to_string(),
                material: BasicMaterial {
                    diffuse_color: Color::from_rgb((r + 1.0) * 0.5, 1.0),
                },
                effect: effect.to_string(),
            },
        )?;
        ids.push(id);
    }
    tracing::debug!("spawned {} cubes under {}", ids.len(), parent.short());
    Ok(ids)
}
