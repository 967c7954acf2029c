//! Recording test doubles for the world's collaborators.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use stagecraft_common::{BoxError, Color, PixelSize};
use stagecraft_config::PhysicsConfig;

use crate::camera::Camera;
use crate::collab::{Composer, Controls, Renderer, ShadowMapSettings};
use crate::diagnostics::{DiagnosticsOverlay, OverlayMode};
use crate::scene::{AnimationMixer, PhysicsScene, Scene, SceneGraph};
use crate::surface::{Element, ElementRef};

pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn record(journal: &Journal, entry: impl Into<String>) {
    journal.borrow_mut().push(entry.into());
}

pub(crate) struct RecordingRenderer {
    journal: Journal,
    size: PixelSize,
    element: ElementRef,
    pub fail: bool,
}

impl RecordingRenderer {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            size: PixelSize::default(),
            element: Element::shared("canvas"),
            fail: false,
        }
    }
}

impl Renderer for RecordingRenderer {
    fn set_clear_color(&mut self, color: Color) {
        record(&self.journal, format!("renderer.clear {color}"));
    }

    fn set_shadow_map(&mut self, settings: ShadowMapSettings) {
        record(
            &self.journal,
            format!(
                "renderer.shadow {} {:?} {}",
                settings.enabled, settings.kind, settings.cascade
            ),
        );
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = PixelSize::new(width, height);
        record(&self.journal, format!("renderer.size {}", self.size));
    }

    fn size(&self) -> PixelSize {
        self.size
    }

    fn render(&mut self, _scene: &Scene, _camera: &dyn Camera) -> Result<(), BoxError> {
        record(&self.journal, "renderer.render");
        if self.fail {
            return Err("gpu lost".into());
        }
        Ok(())
    }

    fn element(&self) -> ElementRef {
        Rc::clone(&self.element)
    }
}

pub(crate) struct RecordingPhysics {
    journal: Journal,
    gravity: Vec3,
    pub fail: bool,
}

impl RecordingPhysics {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            gravity: Vec3::ZERO,
            fail: false,
        }
    }
}

impl PhysicsScene for RecordingPhysics {
    fn configure(&mut self, config: &PhysicsConfig) {
        record(
            &self.journal,
            format!("physics.configure {}", config.solver.iterations),
        );
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn simulate(&mut self, _graph: &mut SceneGraph) -> Result<(), BoxError> {
        record(&self.journal, "physics.simulate");
        if self.fail {
            return Err("solver diverged".into());
        }
        Ok(())
    }
}

pub(crate) struct RecordingMixer(pub Journal);

impl AnimationMixer for RecordingMixer {
    fn update(&mut self, _delta: f64) {
        record(&self.0, "mixer.update");
    }
}

pub(crate) struct RecordingComposer(pub Journal);

impl Composer for RecordingComposer {
    fn reset(&mut self) {
        record(&self.0, "composer.reset");
    }

    fn render(&mut self, _scene: &Scene, _camera: &dyn Camera) -> Result<(), BoxError> {
        record(&self.0, "composer.render");
        Ok(())
    }

    fn pass(&mut self) -> Result<(), BoxError> {
        record(&self.0, "composer.pass");
        Ok(())
    }

    fn to_screen(&mut self) -> Result<(), BoxError> {
        record(&self.0, "composer.to_screen");
        Ok(())
    }
}

pub(crate) struct RecordingControls(pub Journal);

impl Controls for RecordingControls {
    fn update(&mut self, delta_ms: f64) {
        record(&self.0, format!("controls.update {delta_ms}"));
    }
}

pub(crate) struct RecordingOverlay {
    journal: Journal,
    mode: OverlayMode,
    element: ElementRef,
}

impl RecordingOverlay {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            mode: OverlayMode::Fps,
            element: Element::shared("div"),
        }
    }
}

impl DiagnosticsOverlay for RecordingOverlay {
    fn begin(&mut self) {
        record(&self.journal, "overlay.begin");
    }

    fn end(&mut self) {
        record(&self.journal, "overlay.end");
    }

    fn set_mode(&mut self, mode: OverlayMode) {
        self.mode = mode;
    }

    fn mode(&self) -> OverlayMode {
        self.mode
    }

    fn element(&self) -> ElementRef {
        Rc::clone(&self.element)
    }
}
