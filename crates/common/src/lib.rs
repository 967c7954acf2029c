//! Shared value types for the stagecraft workspace.

mod types;

pub use types::{BoxError, Color, ColorParseError, NodeId, PixelSize, Transform};
