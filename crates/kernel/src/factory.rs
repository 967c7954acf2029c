use std::rc::Rc;

use stagecraft_common::PixelSize;
use stagecraft_config::Config;
use thiserror::Error;

use crate::camera::PerspectiveCamera;
use crate::clock::{MonotonicClock, TimeSource};
use crate::collab::{Renderer, ShadowMapSettings};
use crate::diagnostics::{DiagnosticsOverlay, StatsOverlay, overlay_mode};
use crate::scene::{PhysicsScene, Scene, SceneNode};
use crate::scheduler::FramePort;
use crate::surface::{Element, ElementRef, prepare_mount};
use crate::world::World;

/// A non-fatal problem found while building a world.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildWarning {
    #[error("no physics backend supplied; simulation disabled")]
    MissingPhysics,
    #[error("no renderer supplied; the world cannot start until one is set")]
    MissingRenderer,
    #[error("unrecognized diagnostics mode '{0}'; using fps")]
    UnrecognizedDiagnosticsMode(String),
    #[error("no frame port supplied; frames must be driven by hand")]
    MissingFramePort,
    #[error("initial render failed: {0}")]
    InitialRenderFailed(String),
}

/// Assembles a [`World`] from a resolved [`Config`] and injected collaborators.
///
/// Subsystems are initialized in a fixed order: scene, presentation surface,
/// diagnostics overlay, camera, renderer, helpers.
pub struct WorldBuilder {
    config: Config,
    physics: Option<Box<dyn PhysicsScene>>,
    renderer: Option<Box<dyn Renderer>>,
    mount: Option<ElementRef>,
    frame_port: Option<Box<dyn FramePort>>,
    time: Option<Rc<dyn TimeSource>>,
    overlay: Option<Box<dyn DiagnosticsOverlay>>,
}

impl WorldBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            physics: None,
            renderer: None,
            mount: None,
            frame_port: None,
            time: None,
            overlay: None,
        }
    }

    pub fn physics(mut self, physics: impl PhysicsScene + 'static) -> Self {
        self.physics = Some(Box::new(physics));
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Element the world's container is mounted into. Defaults to a fresh
    /// element tagged with `mount_element`.
    pub fn mount(mut self, mount: ElementRef) -> Self {
        self.mount = Some(mount);
        self
    }

    pub fn frame_port(mut self, port: impl FramePort + 'static) -> Self {
        self.frame_port = Some(Box::new(port));
        self
    }

    pub fn time_source(mut self, time: Rc<dyn TimeSource>) -> Self {
        self.time = Some(time);
        self
    }

    /// Replace the built-in [`StatsOverlay`]. Only used when diagnostics are enabled.
    pub fn overlay(mut self, overlay: impl DiagnosticsOverlay + 'static) -> Self {
        self.overlay = Some(Box::new(overlay));
        self
    }

    pub fn build(self) -> World {
        let _span = tracing::info_span!("world_build").entered();
        let Self {
            config,
            physics,
            renderer,
            mount,
            frame_port,
            time,
            overlay,
        } = self;
        let time: Rc<dyn TimeSource> = time.unwrap_or_else(|| Rc::new(MonotonicClock::new()));
        let mut warnings = Vec::new();

        // Scene.
        if physics.is_none() {
            warn(&mut warnings, BuildWarning::MissingPhysics);
        }
        let simulate = physics.is_some();
        let mut scene = Scene::new(physics);
        scene.configure_physics(&config.physics);
        scene.set_gravity(config.gravity);
        tracing::debug!(gravity = ?config.gravity, simulate, "scene ready");

        // Presentation surface.
        let mount = mount.unwrap_or_else(|| Element::shared(config.mount_element.clone()));
        let container = prepare_mount(&mount);

        // Diagnostics overlay.
        let overlay = match overlay_mode(&config.diagnostics) {
            Some((mode, unrecognized)) => {
                if unrecognized {
                    warn(
                        &mut warnings,
                        BuildWarning::UnrecognizedDiagnosticsMode(config.diagnostics.to_string()),
                    );
                }
                let mut overlay = overlay.unwrap_or_else(|| {
                    Box::new(StatsOverlay::new(mode, Rc::clone(&time))) as Box<dyn DiagnosticsOverlay>
                });
                overlay.set_mode(mode);
                let element = overlay.element();
                {
                    let mut e = element.borrow_mut();
                    e.set_style("position", "absolute");
                    e.set_style("left", "0px");
                    e.set_style("bottom", "0px");
                }
                container.borrow_mut().append_child(element);
                tracing::debug!(%mode, "diagnostics overlay mounted");
                Some(overlay)
            }
            None => None,
        };

        // Camera.
        let camera = PerspectiveCamera::from_config(&config.camera, config.viewport.aspect());
        let children = vec![scene.add(SceneNode::camera_marker(config.camera.position))];
        tracing::debug!(fov = camera.fov, aspect = camera.aspect, "camera ready");

        // Renderer.
        let renderer = match renderer {
            Some(mut renderer) => {
                renderer.set_clear_color(config.background);
                renderer.set_shadow_map(ShadowMapSettings {
                    enabled: config.shadow_map.enabled,
                    kind: config.shadow_map.kind,
                    cascade: true,
                });
                let size = PixelSize::scaled(
                    config.viewport.width,
                    config.viewport.height,
                    config.render_scale.width,
                    config.render_scale.height,
                );
                renderer.set_size(size.width, size.height);
                if let Err(err) = renderer.render(&scene, &camera) {
                    warn(
                        &mut warnings,
                        BuildWarning::InitialRenderFailed(err.to_string()),
                    );
                }
                let element = renderer.element();
                {
                    let mut e = element.borrow_mut();
                    e.set_style("width", "100%");
                    e.set_style("height", "100%");
                }
                container.borrow_mut().append_child(element);
                tracing::debug!(%size, "renderer ready");
                Some(renderer)
            }
            None => {
                warn(&mut warnings, BuildWarning::MissingRenderer);
                None
            }
        };

        // Helpers.
        if let Some(axis) = &config.helpers.axis {
            scene.add(SceneNode::axis_helper(axis.size));
        }
        if let Some(grid) = &config.helpers.grid {
            scene.add(SceneNode::grid_helper(grid.size, grid.step));
        }

        if frame_port.is_none() {
            warn(&mut warnings, BuildWarning::MissingFramePort);
        }

        tracing::info!(
            nodes = scene.graph().len(),
            warnings = warnings.len(),
            "world built"
        );
        World::assemble(crate::world::Parts {
            config,
            scene,
            camera: Box::new(camera),
            renderer,
            overlay,
            mount,
            container,
            children,
            simulate,
            frame_port,
            time,
            warnings,
        })
    }
}

fn warn(warnings: &mut Vec<BuildWarning>, warning: BuildWarning) {
    tracing::warn!(%warning, "world build");
    warnings.push(warning);
}
