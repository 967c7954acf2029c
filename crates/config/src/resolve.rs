use glam::Vec3;

use crate::effective::{
    AxisHelper, CameraConfig, Config, Diagnostics, Extent, GridHelper, HelpersConfig,
    MaterialConfig, PhysicsConfig, ShadowMapConfig, SolverConfig,
};
use crate::options::{DiagnosticsOption, HelperOption, Options};

const AXIS_SIZE: f32 = 5.0;
const GRID_SIZE: f32 = 10.0;
const GRID_STEP: f32 = 1.0;

/// Merge `options` over the defaults for a host viewport of `host`.
///
/// Each branch (camera, physics, helpers, shadow map, ...) is merged field by
/// field, so a partially specified branch keeps the defaults of its siblings.
/// Values are not range-checked.
pub fn resolve(options: &Options, host: Extent) -> Config {
    let d = Config::defaults(host);

    let camera = CameraConfig {
        fov: options.camera.fov.unwrap_or(d.camera.fov),
        near: options.camera.near.unwrap_or(d.camera.near),
        far: options.camera.far.unwrap_or(d.camera.far),
        position: Vec3::new(
            options.camera.x.unwrap_or(d.camera.position.x),
            options.camera.y.unwrap_or(d.camera.position.y),
            options.camera.z.unwrap_or(d.camera.position.z),
        ),
    };

    let p = &options.physics;
    let physics = PhysicsConfig {
        quat_normalize_skip: p.quat_normalize_skip.unwrap_or(d.physics.quat_normalize_skip),
        quat_normalize_fast: p.quat_normalize_fast.unwrap_or(d.physics.quat_normalize_fast),
        solver: SolverConfig {
            iterations: p.solver.iterations.unwrap_or(d.physics.solver.iterations),
            tolerance: p.solver.tolerance.unwrap_or(d.physics.solver.tolerance),
        },
        default_material: MaterialConfig {
            contact_stiffness: p
                .default_material
                .contact_stiffness
                .unwrap_or(d.physics.default_material.contact_stiffness),
            contact_regularization_time: p
                .default_material
                .contact_regularization_time
                .unwrap_or(d.physics.default_material.contact_regularization_time),
        },
    };

    let config = Config {
        diagnostics: resolve_diagnostics(options.diagnostics.as_ref()),
        auto_resize: options.auto_resize.unwrap_or(d.auto_resize),
        shadow_map: ShadowMapConfig {
            enabled: options.shadow_map.enabled.unwrap_or(d.shadow_map.enabled),
            kind: options.shadow_map.kind.unwrap_or(d.shadow_map.kind),
        },
        helpers: HelpersConfig {
            axis: resolve_helper(options.helpers.axis.as_ref(), AXIS_SIZE)
                .map(|(size, _)| AxisHelper { size }),
            grid: resolve_helper(options.helpers.grid.as_ref(), GRID_SIZE)
                .map(|(size, step)| GridHelper { size, step }),
        },
        gravity: Vec3::new(
            options.gravity.x.unwrap_or(d.gravity.x),
            options.gravity.y.unwrap_or(d.gravity.y),
            options.gravity.z.unwrap_or(d.gravity.z),
        ),
        camera,
        render_scale: Extent::new(
            options.render_scale.width.unwrap_or(d.render_scale.width),
            options.render_scale.height.unwrap_or(d.render_scale.height),
        ),
        viewport: Extent::new(
            options.viewport.width.unwrap_or(d.viewport.width),
            options.viewport.height.unwrap_or(d.viewport.height),
        ),
        physics,
        background: options.background.unwrap_or(d.background),
        assets_path: options.assets_path.clone().unwrap_or(d.assets_path),
        mount_element: options.mount_element.clone().unwrap_or(d.mount_element),
        physics_worker_script_path: options
            .physics_worker_script_path
            .clone()
            .unwrap_or(d.physics_worker_script_path),
        physics_engine_script_path: options
            .physics_engine_script_path
            .clone()
            .unwrap_or(d.physics_engine_script_path),
    };

    tracing::trace!(?config, "resolved configuration");
    config
}

impl Options {
    /// See [`resolve`].
    pub fn resolve(&self, host: Extent) -> Config {
        resolve(self, host)
    }
}

fn resolve_diagnostics(option: Option<&DiagnosticsOption>) -> Diagnostics {
    match option {
        None | Some(DiagnosticsOption::Flag(false)) => Diagnostics::Off,
        Some(DiagnosticsOption::Flag(true)) => Diagnostics::Fps,
        Some(DiagnosticsOption::Mode(mode)) => Diagnostics::from_mode(mode),
    }
}

/// Returns `(size, step)` for an enabled helper.
fn resolve_helper(option: Option<&HelperOption>, default_size: f32) -> Option<(f32, f32)> {
    match option {
        None | Some(HelperOption::Flag(false)) => None,
        Some(HelperOption::Flag(true)) => Some((default_size, GRID_STEP)),
        Some(HelperOption::Params(p)) => Some((
            p.size.unwrap_or(default_size),
            p.step.unwrap_or(GRID_STEP),
        )),
    }
}
