//! Rigid-body physics for stagecraft scenes.
//!
//! [`RapierScene`] implements the kernel's `PhysicsScene` contract. Bodies are
//! attached to scene node ids before (or after) the nodes are added to a world;
//! every step copies body poses into the matching node transforms.

mod rigid;

pub use rigid::{BodyDesc, BodyShape, PHYSICS_DT, RapierScene};

pub fn crate_info() -> &'static str {
    "stagecraft-physics v0.1.0"
}
