//! wgpu render backend for stagecraft worlds.
//!
//! Draws grid and axis helpers as line lists and every mesh or morph node as
//! an instanced, lit box. Owns its surface, device and queue so it can sit
//! behind the kernel `Renderer` trait.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - A lost or outdated surface is reconfigured and the frame is skipped.

mod error;
mod geometry;
mod gpu;
mod shaders;

pub use error::GpuError;
pub use gpu::WgpuRenderer;

pub fn crate_info() -> &'static str {
    "stagecraft-render-wgpu v0.1.0"
}
