use stagecraft_common::BoxError;
use thiserror::Error;

/// Failures of world-level operations outside the frame loop.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("value assigned as camera does not implement a known camera type")]
    NotACamera,
    #[error("world has no camera")]
    MissingCamera,
    #[error("world has no renderer")]
    MissingRenderer,
}

/// Reasons [`crate::World::start`] refuses to run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("frame scheduler is already running")]
    AlreadyRunning,
    #[error("cannot start without a camera")]
    MissingCamera,
    #[error("cannot start without a renderer")]
    MissingRenderer,
}

/// A failure that aborted the remainder of one tick.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("tick requires a camera")]
    MissingCamera,
    #[error("tick requires a renderer")]
    MissingRenderer,
    #[error("physics step failed: {0}")]
    Physics(#[source] BoxError),
    #[error("render failed: {0}")]
    Render(#[source] BoxError),
    #[error("composer failed: {0}")]
    Composer(#[source] BoxError),
    #[error("loop '{name}' failed: {source}")]
    Loop {
        name: String,
        #[source]
        source: BoxError,
    },
}
