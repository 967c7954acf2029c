use std::fmt;
use std::rc::Rc;

use stagecraft_common::{BoxError, Color, PixelSize};
use stagecraft_kernel::{Camera, Composer, ElementRef, Scene};

use crate::renderer::describe_frame;

/// A post-processing pass over the frame buffer.
pub type PassFn = Box<dyn FnMut(&mut String) -> Result<(), BoxError>>;

/// Composer that renders into a read buffer, runs named passes over it and
/// presents the result on a target element.
pub struct PassComposer {
    target: ElementRef,
    size: PixelSize,
    clear: Color,
    read: String,
    passes: Vec<(String, PassFn)>,
    presented: u64,
}

impl fmt::Debug for PassComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassComposer")
            .field("size", &self.size)
            .field("clear", &self.clear)
            .field("passes", &self.pass_names())
            .field("presented", &self.presented)
            .finish_non_exhaustive()
    }
}

impl PassComposer {
    pub fn new(target: ElementRef, size: PixelSize, clear: Color) -> Self {
        Self {
            target,
            size,
            clear,
            read: String::new(),
            passes: Vec::new(),
            presented: 0,
        }
    }

    /// Append a pass. Passes run in the order they were added.
    pub fn add_pass(
        &mut self,
        name: impl Into<String>,
        pass: impl FnMut(&mut String) -> Result<(), BoxError> + 'static,
    ) {
        self.passes.push((name.into(), Box::new(pass)));
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn buffer(&self) -> &str {
        &self.read
    }

    /// Shared handle to the presentation target.
    pub fn target(&self) -> ElementRef {
        Rc::clone(&self.target)
    }
}

impl Composer for PassComposer {
    fn reset(&mut self) {
        self.read.clear();
    }

    fn render(&mut self, scene: &Scene, camera: &dyn Camera) -> Result<(), BoxError> {
        self.read = describe_frame(self.presented, self.size, self.clear, scene, camera);
        Ok(())
    }

    fn pass(&mut self) -> Result<(), BoxError> {
        for (name, pass) in &mut self.passes {
            pass(&mut self.read).map_err(|err| format!("pass '{name}': {err}"))?;
        }
        Ok(())
    }

    fn to_screen(&mut self) -> Result<(), BoxError> {
        self.target.borrow_mut().set_text(self.read.clone());
        self.presented += 1;
        tracing::trace!(presented = self.presented, "composer presented");
        Ok(())
    }
}
