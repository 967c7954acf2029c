use serde::{Deserialize, Serialize};
use stagecraft_common::Color;
use std::collections::BTreeMap;
use std::path::Path;

use crate::effective::ShadowMapType;

/// Errors from loading an options file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported options format: {0}")]
    UnsupportedFormat(String),
}

/// User-supplied options. Every field is optional; missing fields are filled
/// from defaults by [`Options::resolve`](crate::resolve).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub diagnostics: Option<DiagnosticsOption>,
    pub auto_resize: Option<bool>,
    pub shadow_map: ShadowMapOptions,
    pub helpers: HelperOptions,
    pub gravity: Vec3Options,
    pub camera: CameraOptions,
    pub render_scale: ExtentOptions,
    pub viewport: ExtentOptions,
    pub physics: PhysicsOptions,
    pub background: Option<Color>,
    pub assets_path: Option<String>,
    pub mount_element: Option<String>,
    pub physics_worker_script_path: Option<String>,
    pub physics_engine_script_path: Option<String>,
    /// Top-level keys this version does not know. Kept so they can be reported.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

/// `diagnostics: false | true | "fps" | "ms" | "memory"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagnosticsOption {
    Flag(bool),
    Mode(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowMapOptions {
    pub enabled: Option<bool>,
    pub kind: Option<ShadowMapType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperOptions {
    pub axis: Option<HelperOption>,
    pub grid: Option<HelperOption>,
}

/// `axis: true` or `grid: { size: 20, step: 2 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HelperOption {
    Flag(bool),
    Params(HelperParams),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperParams {
    pub size: Option<f32>,
    pub step: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3Options {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    pub fov: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

/// Width/height pair used by both `viewport` and `render_scale`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtentOptions {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsOptions {
    pub quat_normalize_skip: Option<u32>,
    pub quat_normalize_fast: Option<bool>,
    pub solver: SolverOptions,
    pub default_material: MaterialOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub iterations: Option<u32>,
    pub tolerance: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialOptions {
    pub contact_stiffness: Option<f64>,
    pub contact_regularization_time: Option<f64>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_yaml::from_str(s)?;
        options.warn_unknown();
        Ok(options)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(s)?;
        options.warn_unknown();
        Ok(options)
    }

    /// Names of top-level keys that were present but not recognized.
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.unknown.keys().map(String::as_str).collect()
    }

    fn warn_unknown(&self) {
        for key in self.unknown.keys() {
            tracing::warn!(%key, "ignoring unknown option");
        }
    }

    /// Load options from a `.yaml`, `.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let contents = std::fs::read_to_string(path)?;
        let options = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&contents)?,
            Some("json") => Self::from_json_str(&contents)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        tracing::debug!(path = %path.display(), "loaded options");
        Ok(options)
    }
}
