use std::fmt::Write;
use std::rc::Rc;

use stagecraft_common::{BoxError, Color, PixelSize};
use stagecraft_kernel::{Camera, Element, ElementRef, NodeKind, Renderer, Scene, ShadowMapSettings};

/// Text rendering of one frame: surface, camera and every scene node.
pub fn describe_frame(
    index: u64,
    size: PixelSize,
    clear: Color,
    scene: &Scene,
    camera: &dyn Camera,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Frame {index} ({size}, clear {clear}) ===");
    let _ = writeln!(out, "Nodes: {}", scene.graph().len());
    let eye = camera.position();
    let _ = writeln!(
        out,
        "Camera: pos=({:.1}, {:.1}, {:.1}) aspect={:.2}",
        eye.x,
        eye.y,
        eye.z,
        camera.aspect()
    );
    for node in scene.graph().iter() {
        let p = node.transform.position;
        let kind = match node.kind {
            NodeKind::Mesh => "mesh".to_string(),
            NodeKind::Camera => "camera".to_string(),
            NodeKind::Morph => "morph".to_string(),
            NodeKind::AxisHelper { size } => format!("axis({size})"),
            NodeKind::GridHelper { size, step } => format!("grid({size}/{step})"),
        };
        let _ = writeln!(
            out,
            "  [{}] {kind} \"{}\" pos=({:.2}, {:.2}, {:.2})",
            node.id.short(),
            node.name,
            p.x,
            p.y,
            p.z
        );
    }
    out
}

/// Renderer producing a human-readable description of each frame.
///
/// Useful for CLI output, logging and exercising the render contract without a GPU.
#[derive(Debug)]
pub struct HeadlessRenderer {
    size: PixelSize,
    clear: Color,
    shadow_map: Option<ShadowMapSettings>,
    frames: u64,
    last_frame: String,
    element: ElementRef,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            size: PixelSize::default(),
            clear: Color::BLACK,
            shadow_map: None,
            frames: 0,
            last_frame: String::new(),
            element: Element::shared("canvas"),
        }
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    pub fn clear_color(&self) -> Color {
        self.clear
    }

    pub fn shadow_map(&self) -> Option<ShadowMapSettings> {
        self.shadow_map
    }
}

impl Renderer for HeadlessRenderer {
    fn set_clear_color(&mut self, color: Color) {
        self.clear = color;
    }

    fn set_shadow_map(&mut self, settings: ShadowMapSettings) {
        self.shadow_map = Some(settings);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = PixelSize::new(width, height);
        let mut canvas = self.element.borrow_mut();
        canvas.set_style("--surface-width", width.to_string());
        canvas.set_style("--surface-height", height.to_string());
    }

    fn size(&self) -> PixelSize {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &dyn Camera) -> Result<(), BoxError> {
        self.last_frame = describe_frame(self.frames, self.size, self.clear, scene, camera);
        self.frames += 1;
        self.element
            .borrow_mut()
            .set_text(format!("frame {}", self.frames));
        tracing::trace!(frame = self.frames, "headless frame");
        Ok(())
    }

    fn element(&self) -> ElementRef {
        Rc::clone(&self.element)
    }
}
