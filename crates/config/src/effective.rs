use glam::Vec3;
use serde::{Deserialize, Serialize};
use stagecraft_common::Color;
use std::fmt;

/// Which diagnostics overlay the world should build, if any.
///
/// Unrecognized mode strings are kept verbatim so world construction can
/// warn about them and fall back to [`Diagnostics::Fps`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(into = "String")]
pub enum Diagnostics {
    #[default]
    Off,
    Fps,
    Ms,
    Memory,
    Unrecognized(String),
}

impl Diagnostics {
    /// Parse a mode string. `mb` is accepted as an alias for `memory`.
    pub fn from_mode(mode: &str) -> Self {
        match mode.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Self::Off,
            "fps" => Self::Fps,
            "ms" => Self::Ms,
            "memory" | "mb" => Self::Memory,
            _ => Self::Unrecognized(mode.to_string()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Fps => f.write_str("fps"),
            Self::Ms => f.write_str("ms"),
            Self::Memory => f.write_str("memory"),
            Self::Unrecognized(s) => f.write_str(s),
        }
    }
}

impl From<Diagnostics> for String {
    fn from(d: Diagnostics) -> String {
        d.to_string()
    }
}

/// Shadow filtering technique requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMapType {
    Basic,
    Pcf,
    #[default]
    PcfSoft,
    Vsm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShadowMapConfig {
    pub enabled: bool,
    pub kind: ShadowMapType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisHelper {
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridHelper {
    pub size: f32,
    pub step: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HelpersConfig {
    pub axis: Option<AxisHelper>,
    pub grid: Option<GridHelper>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

/// Width/height pair in logical units (viewport) or multipliers (render scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// `width / height`, as used for camera aspect ratios.
    pub fn aspect(&self) -> f32 {
        (self.width / self.height) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolverConfig {
    pub iterations: u32,
    pub tolerance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaterialConfig {
    pub contact_stiffness: f64,
    pub contact_regularization_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicsConfig {
    /// Normalize body quaternions every `skip + 1` steps.
    pub quat_normalize_skip: u32,
    pub quat_normalize_fast: bool,
    pub solver: SolverConfig,
    pub default_material: MaterialConfig,
}

/// Fully resolved, immutable configuration consumed by every subsystem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub diagnostics: Diagnostics,
    pub auto_resize: bool,
    pub shadow_map: ShadowMapConfig,
    pub helpers: HelpersConfig,
    pub gravity: Vec3,
    pub camera: CameraConfig,
    pub render_scale: Extent,
    pub viewport: Extent,
    pub physics: PhysicsConfig,
    pub background: Color,
    pub assets_path: String,
    pub mount_element: String,
    pub physics_worker_script_path: String,
    pub physics_engine_script_path: String,
}

impl Config {
    /// The documented defaults for a host whose viewport is `viewport`.
    pub fn defaults(viewport: Extent) -> Self {
        Self {
            diagnostics: Diagnostics::Off,
            auto_resize: false,
            shadow_map: ShadowMapConfig {
                enabled: true,
                kind: ShadowMapType::PcfSoft,
            },
            helpers: HelpersConfig::default(),
            gravity: Vec3::ZERO,
            camera: CameraConfig {
                fov: 75.0,
                near: 1.0,
                far: 1000.0,
                position: Vec3::ZERO,
            },
            render_scale: Extent::new(1.0, 1.0),
            viewport,
            physics: PhysicsConfig {
                quat_normalize_skip: 0,
                quat_normalize_fast: false,
                solver: SolverConfig {
                    iterations: 20,
                    tolerance: 0.0,
                },
                default_material: MaterialConfig {
                    contact_stiffness: 1e8,
                    contact_regularization_time: 3.0,
                },
            },
            background: Color::BLACK,
            assets_path: "./assets".into(),
            mount_element: "body".into(),
            physics_worker_script_path: "../libs/physics_worker.js".into(),
            physics_engine_script_path: "../libs/physics_engine.js".into(),
        }
    }

    /// Render the configuration as YAML, e.g. for `stagecraft-cli config`.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
