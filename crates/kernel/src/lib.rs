//! World Kernel: subsystem initialization, frame scheduling and per-frame loops.
//!
//! # Invariants
//! - A started world always has exactly one camera and one renderer.
//! - Within a tick, physics and animation run before rendering; loops run after.
//! - The next frame is requested before any tick work, so a failing tick never
//!   ends the frame chain.

mod camera;
mod clock;
mod collab;
mod diagnostics;
mod error;
mod factory;
mod loops;
mod scene;
mod scheduler;
mod surface;
#[cfg(test)]
mod testing;
mod world;

pub use camera::{Camera, OrthographicCamera, PerspectiveCamera};
pub use clock::{ManualClock, MonotonicClock, Stopwatch, TimeSource};
pub use collab::{Composer, Controls, Renderer, ShadowMapSettings};
pub use diagnostics::{
    DiagnosticsOverlay, FrameTimer, MemoryProbe, OverlayMode, StatsOverlay, overlay_mode,
};
pub use error::{StartError, TickError, WorldError};
pub use factory::{BuildWarning, WorldBuilder};
pub use loops::{LoopClock, LoopHandle, LoopRegistry, LoopResult};
pub use scene::{AnimationMixer, NodeKind, PhysicsScene, Scene, SceneGraph, SceneNode};
pub use scheduler::{
    DEFAULT_FRAME_INTERVAL, Frame, FramePort, FrameRequests, FrameScheduler, QueuedFramePort,
    SchedulerState, TickOutcome, TimerDriver,
};
pub use surface::{CONTAINER_CLASS, Element, ElementRef};
pub use world::World;

pub fn crate_info() -> &'static str {
    "stagecraft-kernel v0.1.0"
}
