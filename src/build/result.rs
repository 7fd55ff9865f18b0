use super::BuildState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
struct ResultData {
    state: BuildState,
    log: Vec<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct ResultInner {
    data: Mutex<ResultData>,
    state_tx: watch::Sender<BuildState>,
}

/// Record of one build: state, ordered log and timestamps.
///
/// Callers only get read access. The owning task appends and transitions
/// through crate-private methods, each under the same lock, so a reader never
/// sees a half-written entry and nothing is logged after a terminal state.
#[derive(Debug, Clone)]
pub struct BuildResult {
    inner: Arc<ResultInner>,
}

/// Consistent copy of a result taken under a single lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResultView {
    pub state: BuildState,
    pub log: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BuildResult {
    pub(crate) fn new() -> Self {
        let (state_tx, _) = watch::channel(BuildState::Pending);
        Self {
            inner: Arc::new(ResultInner {
                data: Mutex::new(ResultData {
                    state: BuildState::Pending,
                    log: Vec::new(),
                    started_at: None,
                    finished_at: None,
                }),
                state_tx,
            }),
        }
    }

    pub fn state(&self) -> BuildState {
        self.inner.data.lock().state
    }

    /// Copy of the log lines so far
    pub fn log(&self) -> Vec<String> {
        self.inner.data.lock().log.clone()
    }

    /// `None` until the build is terminal. Cancellation is not a failure.
    pub fn failed(&self) -> Option<bool> {
        let state = self.state();
        state
            .is_terminal()
            .then_some(state == BuildState::Failed)
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.inner.data.lock().finished_at
    }

    pub(crate) fn view(&self) -> ResultView {
        let data = self.inner.data.lock();
        ResultView {
            state: data.state,
            log: data.log.clone(),
            started_at: data.started_at,
            finished_at: data.finished_at,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<BuildState> {
        self.inner.state_tx.subscribe()
    }

    /// Appends an output line. Dropped once the build is terminal.
    pub(crate) fn append(&self, line: impl Into<String>) -> bool {
        let mut data = self.inner.data.lock();
        if data.state.is_terminal() {
            return false;
        }
        data.log.push(line.into());
        true
    }

    /// Moves to `next` and logs `line` atomically. Returns false, changing
    /// nothing, if the transition would not move forward.
    pub(crate) fn transition(&self, next: BuildState, line: impl Into<String>) -> bool {
        let mut data = self.inner.data.lock();
        if !data.state.can_transition_to(next) {
            return false;
        }

        data.state = next;
        data.log.push(line.into());
        if next == BuildState::Running {
            data.started_at = Some(Utc::now());
        }
        if next.is_terminal() {
            data.finished_at = Some(Utc::now());
        }
        self.inner.state_tx.send_replace(next);
        true
    }
}
