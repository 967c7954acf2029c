//! Collaborator contracts the world drives each frame.

use stagecraft_common::{BoxError, Color, PixelSize};
use stagecraft_config::ShadowMapType;

use crate::camera::Camera;
use crate::scene::Scene;
use crate::surface::ElementRef;

/// Shadow-map settings pushed to a renderer during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowMapSettings {
    pub enabled: bool,
    pub kind: ShadowMapType,
    pub cascade: bool,
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and camera; it never mutates them.
pub trait Renderer {
    fn set_clear_color(&mut self, color: Color);

    fn set_shadow_map(&mut self, settings: ShadowMapSettings);

    /// Resize the output surface, in physical pixels.
    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> PixelSize;

    /// Render one frame of `scene` as seen from `camera`.
    fn render(&mut self, scene: &Scene, camera: &dyn Camera) -> Result<(), BoxError>;

    /// The output surface element, mounted into the world's container.
    fn element(&self) -> ElementRef;
}

/// Post-processing pipeline presenting a stack of passes instead of the plain render.
pub trait Composer {
    /// Clear intermediate buffers for a new frame.
    fn reset(&mut self);

    /// Render the scene into the composer's read buffer.
    fn render(&mut self, scene: &Scene, camera: &dyn Camera) -> Result<(), BoxError>;

    /// Run the configured pass stack.
    fn pass(&mut self) -> Result<(), BoxError>;

    /// Present the final buffer to the output surface.
    fn to_screen(&mut self) -> Result<(), BoxError>;
}

/// User-input controls, advanced once per frame.
pub trait Controls {
    /// `delta_ms` is wall-clock milliseconds since the previous update.
    fn update(&mut self, delta_ms: f64);
}
