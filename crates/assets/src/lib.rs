//! Asset library: queued effect loading, content-addressed ids, built-in geometry.
//!
//! Effects are queued by path relative to the asset root and loaded in one
//! batch. Consumers look them up by the same path they were queued under.
//!
//! # Layout
//! ```text
//! assets/
//!   effect/Basic.effect
//!   effect/Basic.wgsl
//!   effect/LightScattering/LightScattering.effect
//!   effect/LightScattering/LightScattering.wgsl
//! ```

mod effect;
mod geometry;

pub use effect::{Effect, EffectFile};
pub use geometry::{Geometry, Vertex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Progress of the loader queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Queued,
    Complete,
    Failed,
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid effect file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("effect {path} declares entry point `{entry}` missing from its shader")]
    MissingEntryPoint { path: String, entry: String },
    #[error("asset not found: {0}")]
    NotFound(String),
}

/// Effects and geometry, keyed by the name they were registered under.
#[derive(Debug, Clone)]
pub struct AssetLibrary {
    root: PathBuf,
    queue: Vec<String>,
    effects: BTreeMap<String, Effect>,
    geometries: BTreeMap<String, (AssetId, Geometry)>,
    state: LoadState,
}

impl AssetLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            queue: Vec::new(),
            effects: BTreeMap::new(),
            geometries: BTreeMap::new(),
            state: LoadState::Idle,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Queue an effect for the next [`load`](Self::load).
    pub fn queue(&mut self, path: impl Into<String>) -> &mut Self {
        self.queue.push(path.into());
        self.state = LoadState::Queued;
        self
    }

    pub fn queued(&self) -> &[String] {
        &self.queue
    }

    /// Load every queued effect. Stops at the first failure.
    pub fn load(&mut self) -> Result<Vec<AssetId>, AssetError> {
        let queue = std::mem::take(&mut self.queue);
        let mut ids = Vec::with_capacity(queue.len());
        for path in queue {
            match self.read_effect(&path) {
                Ok(effect) => {
                    tracing::debug!("loaded effect {} ({})", effect.name, path);
                    ids.push(effect.id);
                    self.effects.insert(path, effect);
                }
                Err(e) => {
                    self.state = LoadState::Failed;
                    return Err(e);
                }
            }
        }
        self.state = LoadState::Complete;
        tracing::info!("asset loader complete: {} effect(s)", ids.len());
        Ok(ids)
    }

    pub fn effect(&self, path: &str) -> Option<&Effect> {
        self.effects.get(path)
    }

    pub fn require_effect(&self, path: &str) -> Result<&Effect, AssetError> {
        self.effect(path)
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    /// Register geometry under a name and return its content id.
    pub fn set_geometry(&mut self, name: impl Into<String>, geometry: Geometry) -> AssetId {
        let id = content_id(&[geometry.vertex_bytes(), geometry.index_bytes()]);
        self.geometries.insert(name.into(), (id, geometry));
        id
    }

    pub fn geometry(&self, name: &str) -> Option<&Geometry> {
        self.geometries.get(name).map(|(_, g)| g)
    }

    pub fn require_geometry(&self, name: &str) -> Result<&Geometry, AssetError> {
        self.geometry(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }

    /// Number of registered effects and geometries.
    pub fn len(&self) -> usize {
        self.effects.len() + self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.geometries.is_empty()
    }

    fn read_effect(&self, path: &str) -> Result<Effect, AssetError> {
        let effect_path = self.root.join(path);
        let text = read_to_string(&effect_path)?;
        let file: EffectFile =
            serde_json::from_str(&text).map_err(|source| AssetError::Parse {
                path: effect_path.clone(),
                source,
            })?;

        let shader_path = effect_path
            .parent()
            .unwrap_or(&self.root)
            .join(&file.shader);
        let source = read_to_string(&shader_path)?;

        let effect = Effect {
            id: content_id(&[path.as_bytes(), source.as_bytes()]),
            name: file.name,
            path: path.to_string(),
            source,
            vertex_entry: file.vertex_entry,
            fragment_entry: file.fragment_entry,
            uniforms: file.uniforms,
        };
        if let Some(entry) = effect.missing_entry_points().into_iter().next() {
            return Err(AssetError::MissingEntryPoint {
                path: path.to_string(),
                entry,
            });
        }
        Ok(effect)
    }
}

fn read_to_string(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn content_id(parts: &[&[u8]]) -> AssetId {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    AssetId(u64::from_le_bytes(bytes))
}

pub fn crate_info() -> &'static str {
    "godray-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_effect(dir: &Path, rel: &str, effect_json: &str, shader_name: &str, shader: &str) {
        let path = dir.join(rel);
        let parent = path.parent().unwrap();
        fs::create_dir_all(parent).unwrap();
        fs::write(&path, effect_json).unwrap();
        fs::write(parent.join(shader_name), shader).unwrap();
    }

    const SHADER: &str = "@vertex fn vs_main() {}\n@fragment fn fs_main() {}\n";

    #[test]
    fn load_queued_effects() {
        let tmp = tempfile::tempdir().unwrap();
        write_effect(
            tmp.path(),
            "effect/Basic.effect",
            r#"{ "name": "Basic", "shader": "Basic.wgsl" }"#,
            "Basic.wgsl",
            SHADER,
        );
        write_effect(
            tmp.path(),
            "effect/LightScattering/LightScattering.effect",
            r#"{ "name": "LightScattering", "shader": "LightScattering.wgsl",
                 "uniforms": { "decay": 0.97 } }"#,
            "LightScattering.wgsl",
            SHADER,
        );

        let mut assets = AssetLibrary::new(tmp.path());
        assert_eq!(assets.state(), LoadState::Idle);
        assets
            .queue("effect/LightScattering/LightScattering.effect")
            .queue("effect/Basic.effect");
        assert_eq!(assets.state(), LoadState::Queued);
        assert_eq!(assets.queued().len(), 2);

        let ids = assets.load().unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(assets.state(), LoadState::Complete);
        assert!(assets.queued().is_empty());

        let ls = assets
            .effect("effect/LightScattering/LightScattering.effect")
            .unwrap();
        assert_eq!(ls.name, "LightScattering");
        assert_eq!(ls.uniform("decay"), Some(0.97));
        assert!(assets.effect("effect/Basic.effect").is_some());
    }

    #[test]
    fn missing_file_fails_load() {
        let tmp = tempfile::tempdir().unwrap();
        let mut assets = AssetLibrary::new(tmp.path());
        assets.queue("effect/Nope.effect");
        let err = assets.load().unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
        assert_eq!(assets.state(), LoadState::Failed);
    }

    #[test]
    fn malformed_effect_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_effect(
            tmp.path(),
            "effect/Bad.effect",
            "{ not json",
            "Bad.wgsl",
            SHADER,
        );
        let mut assets = AssetLibrary::new(tmp.path());
        assets.queue("effect/Bad.effect");
        assert!(matches!(assets.load(), Err(AssetError::Parse { .. })));
    }

    #[test]
    fn undefined_entry_point_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_effect(
            tmp.path(),
            "effect/Half.effect",
            r#"{ "name": "Half", "shader": "Half.wgsl" }"#,
            "Half.wgsl",
            "@vertex fn vs_main() {}\n",
        );
        let mut assets = AssetLibrary::new(tmp.path());
        assets.queue("effect/Half.effect");
        match assets.load() {
            Err(AssetError::MissingEntryPoint { entry, .. }) => assert_eq!(entry, "fs_main"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn geometry_registry_is_content_addressed() {
        let mut assets = AssetLibrary::new(".");
        let a = assets.set_geometry("cube", Geometry::cube());
        let b = assets.set_geometry("cube2", Geometry::cube());
        let q = assets.set_geometry("quad", Geometry::quad());
        assert_eq!(a, b);
        assert_ne!(a, q);
        assert_eq!(assets.len(), 3);
        assert!(assets.geometry("cube").is_some());
        assert!(matches!(
            assets.require_geometry("sphere"),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn bundled_assets_load() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets");
        let mut assets = AssetLibrary::new(root);
        assets
            .queue("effect/LightScattering/LightScattering.effect")
            .queue("effect/Basic.effect");
        assets.load().unwrap();
        let ls = assets
            .require_effect("effect/LightScattering/LightScattering.effect")
            .unwrap();
        for name in ["density", "weight", "decay", "exposure", "samples"] {
            assert!(ls.uniform(name).is_some(), "missing uniform {name}");
        }
    }
}
