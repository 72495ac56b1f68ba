use godray_common::{Color, NodeId, Transform};
use std::collections::BTreeMap;

/// An event record produced by every mutation to the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Node was created under `parent` (`None` only for the root).
    NodeAdded {
        id: NodeId,
        parent: Option<NodeId>,
    },
    /// A surface was attached to the node.
    SurfaceAttached { id: NodeId },
}

/// Flat-colored material consumed by the basic effect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BasicMaterial {
    pub diffuse_color: Color,
}

/// Drawable attachment: geometry and effect are referenced by asset name.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub geometry: String,
    pub material: BasicMaterial,
    pub effect: String,
}

/// A scene node. Children keep insertion order.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: Transform,
    pub surface: Option<Surface>,
}

/// Errors from scene mutations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("node {0:?} already has a surface")]
    SurfaceAlreadyAttached(NodeId),
}

/// Node tree rooted at a single `root` node.
///
/// All mutations go through explicit operations and are recorded in the
/// event log.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    event_log: Vec<SceneEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene holding only the root node.
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node {
                name: Some("root".into()),
                parent: None,
                children: Vec::new(),
                transform: Transform::default(),
                surface: None,
            },
        );
        Self {
            nodes,
            root,
            event_log: vec![SceneEvent::NodeAdded {
                id: root,
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// First node with the given name in depth-first tree order from the root.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.name.as_deref() == Some(name) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Create a child of `parent`. Returns its id.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        let id = NodeId::new();
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(SceneError::NodeNotFound(parent))?;
        parent_node.children.push(id);
        self.nodes.insert(
            id,
            Node {
                name: name.map(str::to_string),
                parent: Some(parent),
                children: Vec::new(),
                transform,
                surface: None,
            },
        );
        self.event_log.push(SceneEvent::NodeAdded {
            id,
            parent: Some(parent),
        });
        Ok(id)
    }

    pub fn add_surface(&mut self, id: NodeId, surface: Surface) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        if node.surface.is_some() {
            return Err(SceneError::SurfaceAlreadyAttached(id));
        }
        node.surface = Some(surface);
        self.event_log.push(SceneEvent::SurfaceAttached { id });
        Ok(())
    }

    /// Every surface in depth-first order from the root, with its node's
    /// world transform matrix.
    pub fn surfaces(&self) -> Vec<(NodeId, glam::Mat4, &Surface)> {
        let mut out = Vec::new();
        let mut stack = vec![(self.root, glam::Mat4::IDENTITY)];
        while let Some((id, parent_matrix)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let world = parent_matrix * node.transform.matrix();
            if let Some(surface) = &node.surface {
                out.push((id, world, surface));
            }
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        out
    }

    pub fn surface_count(&self) -> usize {
        self.nodes.values().filter(|n| n.surface.is_some()).count()
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn surface() -> Surface {
        Surface {
            geometry: "cube".into(),
            material: BasicMaterial::default(),
            effect: "effect/Basic.effect".into(),
        }
    }

    #[test]
    fn scene_starts_with_root() {
        let s = Scene::new();
        assert_eq!(s.node_count(), 1);
        assert_eq!(s.find("root"), Some(s.root()));
        assert!(s.children(s.root()).is_empty());
        assert_eq!(s.events().len(), 1);
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut s = Scene::new();
        let root = s.root();
        let a = s.add_child(root, Some("camera"), Transform::default()).unwrap();
        let b = s.add_child(root, Some("meshes"), Transform::default()).unwrap();
        assert_eq!(s.children(root), &[a, b]);
        assert_eq!(s.get(b).unwrap().parent, Some(root));
        assert_eq!(s.find("meshes"), Some(b));
    }

    #[test]
    fn find_follows_tree_order_for_repeated_names() {
        let mut s = Scene::new();
        let root = s.root();
        let group = s.add_child(root, Some("group"), Transform::default()).unwrap();
        let nested = s.add_child(group, Some("cube"), Transform::default()).unwrap();
        for _ in 0..16 {
            s.add_child(root, Some("cube"), Transform::default()).unwrap();
        }
        assert_eq!(s.find("cube"), Some(nested));
        assert_eq!(s.find("missing"), None);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut s = Scene::new();
        let ghost = NodeId::new();
        assert_eq!(
            s.add_child(ghost, None, Transform::default()),
            Err(SceneError::NodeNotFound(ghost))
        );
        assert_eq!(s.node_count(), 1);
    }

    #[test]
    fn one_surface_per_node() {
        let mut s = Scene::new();
        let id = s.add_child(s.root(), None, Transform::default()).unwrap();
        s.add_surface(id, surface()).unwrap();
        assert_eq!(
            s.add_surface(id, surface()),
            Err(SceneError::SurfaceAlreadyAttached(id))
        );
        assert_eq!(s.surface_count(), 1);
    }

    #[test]
    fn surfaces_compose_parent_transforms() {
        let mut s = Scene::new();
        let group = s
            .add_child(
                s.root(),
                Some("meshes"),
                Transform {
                    position: Vec3::new(0.0, 10.0, 0.0),
                    ..Transform::default()
                },
            )
            .unwrap();
        let id = s
            .add_child(
                group,
                None,
                Transform::from_translation_scale(Vec3::new(1.0, 0.0, 0.0), 2.0),
            )
            .unwrap();
        s.add_surface(id, surface()).unwrap();

        let surfaces = s.surfaces();
        assert_eq!(surfaces.len(), 1);
        let origin = surfaces[0].1.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn events_are_recorded() {
        let mut s = Scene::new();
        let id = s.add_child(s.root(), None, Transform::default()).unwrap();
        s.add_surface(id, surface()).unwrap();
        // root + add + surface
        assert_eq!(s.events().len(), 3);
        let drained = s.drain_events();
        assert_eq!(drained.len(), 3);
        assert!(s.events().is_empty());
    }
}
