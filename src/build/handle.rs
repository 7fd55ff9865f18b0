use super::{BuildResult, BuildState, CancelToken};
use crate::buildsystem::{BuildSystemId, Project};
use crate::flags::BuildFlags;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Caller-side reference to a running or finished build.
///
/// Cloning is cheap; all clones observe the same build. The handle can read
/// and cancel but never write the result.
#[derive(Debug, Clone)]
pub struct BuildHandle {
    id: Uuid,
    project: Arc<Project>,
    flags: Arc<BuildFlags>,
    result: BuildResult,
    cancel: CancelToken,
}

/// Point-in-time copy of a build, safe to serialize or hold onto
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSnapshot {
    pub id: Uuid,
    pub build_system: BuildSystemId,
    pub root: PathBuf,
    pub state: BuildState,
    /// Only set once the state is terminal
    pub failed: Option<bool>,
    pub log: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BuildHandle {
    pub(crate) fn new(
        id: Uuid,
        project: Arc<Project>,
        flags: Arc<BuildFlags>,
        result: BuildResult,
        cancel: CancelToken,
    ) -> Self {
        Self {
            id,
            project,
            flags,
            result,
            cancel,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn flags(&self) -> &BuildFlags {
        &self.flags
    }

    pub fn result(&self) -> &BuildResult {
        &self.result
    }

    pub fn state(&self) -> BuildState {
        self.result.state()
    }

    pub fn failed(&self) -> Option<bool> {
        self.result.failed()
    }

    pub fn log(&self) -> Vec<String> {
        self.result.log()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Requests cancellation. No effect once the build is terminal.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn snapshot(&self) -> BuildSnapshot {
        let view = self.result.view();
        BuildSnapshot {
            id: self.id,
            build_system: self.project.build_system().clone(),
            root: self.project.root().to_path_buf(),
            state: view.state,
            failed: view
                .state
                .is_terminal()
                .then_some(view.state == BuildState::Failed),
            log: view.log,
            started_at: view.started_at,
            finished_at: view.finished_at,
        }
    }

    /// Waits for the terminal state and returns the final snapshot.
    pub async fn wait(&self) -> BuildSnapshot {
        let mut rx = self.result.subscribe();
        // The result owns the sender, and we hold the result.
        let _ = rx.wait_for(|state| state.is_terminal()).await;
        self.snapshot()
    }
}
