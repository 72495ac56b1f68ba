use crate::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_vertex_entry() -> String {
    "vs_main".into()
}

fn default_fragment_entry() -> String {
    "fs_main".into()
}

/// On-disk `.effect` description (JSON).
///
/// ```json
/// {
///   "name": "Basic",
///   "shader": "Basic.wgsl",
///   "uniforms": { "ambient": 0.3 }
/// }
/// ```
///
/// `shader` is resolved relative to the directory holding the effect file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectFile {
    pub name: String,
    pub shader: String,
    #[serde(default = "default_vertex_entry")]
    pub vertex_entry: String,
    #[serde(default = "default_fragment_entry")]
    pub fragment_entry: String,
    #[serde(default)]
    pub uniforms: BTreeMap<String, f32>,
}

/// A loaded effect: WGSL source plus its entry points and default uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub id: AssetId,
    pub name: String,
    /// Path the effect was queued under, relative to the asset root.
    pub path: String,
    pub source: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub uniforms: BTreeMap<String, f32>,
}

impl Effect {
    pub fn uniform(&self, name: &str) -> Option<f32> {
        self.uniforms.get(name).copied()
    }

    pub fn uniform_or(&self, name: &str, default: f32) -> f32 {
        self.uniform(name).unwrap_or(default)
    }

    /// Entry points declared by the effect that the shader source does not define.
    pub(crate) fn missing_entry_points(&self) -> Vec<String> {
        [&self.vertex_entry, &self.fragment_entry]
            .into_iter()
            .filter(|entry| !self.source.contains(&format!("fn {entry}(")))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_default() {
        let file: EffectFile =
            serde_json::from_str(r#"{ "name": "Basic", "shader": "Basic.wgsl" }"#).unwrap();
        assert_eq!(file.vertex_entry, "vs_main");
        assert_eq!(file.fragment_entry, "fs_main");
        assert!(file.uniforms.is_empty());
    }

    #[test]
    fn camel_case_fields() {
        let file: EffectFile = serde_json::from_str(
            r#"{
                "name": "LightScattering",
                "shader": "LightScattering.wgsl",
                "vertexEntry": "vs_quad",
                "uniforms": { "decay": 0.97, "samples": 64 }
            }"#,
        )
        .unwrap();
        assert_eq!(file.vertex_entry, "vs_quad");
        assert_eq!(file.uniforms.get("samples"), Some(&64.0));
    }

    #[test]
    fn uniform_lookup_and_missing_entries() {
        let effect = Effect {
            id: AssetId(1),
            name: "Test".into(),
            path: "effect/Test.effect".into(),
            source: "fn vs_main() {}".into(),
            vertex_entry: "vs_main".into(),
            fragment_entry: "fs_main".into(),
            uniforms: BTreeMap::from([("decay".to_string(), 0.5)]),
        };
        assert_eq!(effect.uniform("decay"), Some(0.5));
        assert_eq!(effect.uniform_or("weight", 0.1), 0.1);
        assert_eq!(effect.missing_entry_points(), vec!["fs_main".to_string()]);
    }
}
