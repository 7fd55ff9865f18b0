//! Logging-based progress handler

use super::{BuildEvent, ProgressHandler};
use crate::build::BuildState;
use tracing::{debug, info, trace, warn};

/// Handler that logs build events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_event(&self, event: &BuildEvent) {
        match event {
            BuildEvent::Detected { root, build_system } => {
                info!(root = %root.display(), build_system = %build_system, "Project detected");
            }
            BuildEvent::Queued { id, root } => {
                debug!(build = %id, root = %root.display(), "Build queued");
            }
            BuildEvent::Started { id, command } => {
                info!(build = %id, command = %command, "Build started");
            }
            BuildEvent::Output { id, line } => {
                trace!(build = %id, "{}", line);
            }
            BuildEvent::Finished {
                id,
                state,
                duration,
            } => match state {
                BuildState::Failed => warn!(
                    build = %id,
                    duration_ms = duration.as_millis() as u64,
                    "Build failed"
                ),
                _ => info!(
                    build = %id,
                    state = %state,
                    duration_ms = duration.as_millis() as u64,
                    "Build finished"
                ),
            },
        }
    }
}
