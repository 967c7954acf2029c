//! Headless rendering: a text renderer for CLI runs and tests, plus a
//! post-processing composer with named passes.
//!
//! # Invariants
//! - Renderers read the scene and camera; they never mutate them.

mod composer;
mod renderer;

pub use composer::{PassComposer, PassFn};
pub use renderer::{HeadlessRenderer, describe_frame};

pub fn crate_info() -> &'static str {
    "stagecraft-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
