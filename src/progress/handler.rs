//! Progress handler trait and events

use crate::build::BuildState;
use crate::buildsystem::BuildSystemId;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Events emitted while orchestrating builds
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// A build system claimed the requested path
    Detected {
        root: PathBuf,
        build_system: BuildSystemId,
    },

    /// Build accepted, waiting for a worker slot
    Queued { id: Uuid, root: PathBuf },

    /// Build tool launched (or about to be)
    Started { id: Uuid, command: String },

    /// One line of build tool output
    Output { id: Uuid, line: String },

    /// Terminal state reached. Emitted exactly once per build.
    Finished {
        id: Uuid,
        state: BuildState,
        duration: Duration,
    },
}

/// Trait for handling build events
pub trait ProgressHandler: Send + Sync {
    fn on_event(&self, event: &BuildEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_event(&self, _event: &BuildEvent) {}
}
