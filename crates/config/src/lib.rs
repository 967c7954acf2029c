//! Configuration Resolver: merges partial user options over documented defaults.
//!
//! # Invariants
//! - Every branch is merged independently; a partial branch never erases sibling defaults.
//! - A resolved [`Config`] is never mutated by the world that consumes it.

mod effective;
mod options;
mod resolve;

pub use effective::{
    AxisHelper, CameraConfig, Config, Diagnostics, Extent, GridHelper, HelpersConfig,
    MaterialConfig, PhysicsConfig, ShadowMapConfig, ShadowMapType, SolverConfig,
};
pub use options::{
    CameraOptions, ConfigError, DiagnosticsOption, ExtentOptions, HelperOption, HelperOptions,
    HelperParams, MaterialOptions, Options, PhysicsOptions, ShadowMapOptions, SolverOptions,
    Vec3Options,
};
pub use resolve::resolve;

pub fn crate_info() -> &'static str {
    "stagecraft-config v0.1.0"
}
