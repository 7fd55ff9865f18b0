//! Asynchronous build execution
//!
//! A `BuildTask` runs the build tool on its own tokio task and reports
//! through a `BuildResult`. Every fault after `start` is captured into the
//! result; nothing is returned to the caller as an error.

use super::{BuildHandle, BuildResult, BuildSnapshot, BuildState, CancelToken};
use crate::buildsystem::Project;
use crate::flags::BuildFlags;
use crate::progress::{BuildEvent, NoOpHandler, ProgressHandler};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};
use uuid::Uuid;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

pub struct BuildTask {
    id: Uuid,
    project: Arc<Project>,
    flags: Arc<BuildFlags>,
    program: String,
    grace_period: Duration,
    limiter: Option<Arc<Semaphore>>,
    project_lock: Option<Arc<Mutex<()>>>,
    progress: Arc<dyn ProgressHandler>,
    log_dir: Option<PathBuf>,
}

impl BuildTask {
    pub fn new(project: Arc<Project>, flags: BuildFlags, program: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project,
            flags: Arc::new(flags),
            program: program.into(),
            grace_period: DEFAULT_GRACE_PERIOD,
            limiter: None,
            project_lock: None,
            progress: Arc::new(NoOpHandler),
            log_dir: None,
        }
    }

    /// Time between SIGTERM and SIGKILL when cancelling
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Holds a permit from `limiter` for the whole build
    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Holds `lock` for the whole build, serializing builds that share it
    pub fn with_project_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.project_lock = Some(lock);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// Writes the final log to `<dir>/<id>.log`
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.flags.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Starts the build on the current tokio runtime and returns at once.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime. Use [`BuildTask::start_on`]
    /// with an explicit runtime handle otherwise.
    pub fn start(self, cancel: CancelToken) -> BuildHandle {
        self.start_on(&Handle::current(), cancel)
    }

    pub fn start_on(self, runtime: &Handle, cancel: CancelToken) -> BuildHandle {
        let result = BuildResult::new();
        let handle = BuildHandle::new(
            self.id,
            Arc::clone(&self.project),
            Arc::clone(&self.flags),
            result.clone(),
            cancel.clone(),
        );

        self.progress.on_event(&BuildEvent::Queued {
            id: self.id,
            root: self.project.root().to_path_buf(),
        });

        let id = self.id;
        let progress = Arc::clone(&self.progress);
        let log_dir = self.log_dir.clone();
        let supervised = handle.clone();
        let queued_at = Instant::now();

        let worker = runtime.spawn(self.run(result.clone(), cancel));
        runtime.spawn(async move {
            match worker.await {
                Ok(()) if result.state().is_terminal() => {}
                Ok(()) => {
                    error!(build = %id, "Build worker exited without a terminal state");
                    result.transition(
                        BuildState::Failed,
                        "build failed: worker exited without a result",
                    );
                }
                Err(e) if e.is_panic() => {
                    error!(build = %id, "Build worker panicked");
                    result.transition(BuildState::Failed, "build failed: worker panicked");
                }
                Err(e) => {
                    error!(build = %id, error = %e, "Build worker aborted");
                    result.transition(BuildState::Failed, "build failed: worker aborted");
                }
            }

            let snapshot = supervised.snapshot();
            if let Some(dir) = log_dir {
                persist_log(&dir, &snapshot).await;
            }
            progress.on_event(&BuildEvent::Finished {
                id,
                state: snapshot.state,
                duration: queued_at.elapsed(),
            });
        });

        handle
    }

    async fn run(self, result: BuildResult, cancel: CancelToken) {
        let _permit = match self.limiter.clone() {
            Some(limiter) => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    result.transition(BuildState::Cancelled, "build cancelled");
                    return;
                }
                permit = limiter.acquire_owned() => match permit {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        result.transition(BuildState::Failed, "build failed: worker pool closed");
                        return;
                    }
                },
            },
            None => None,
        };

        let _project_guard = match self.project_lock.clone() {
            Some(lock) => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    result.transition(BuildState::Cancelled, "build cancelled");
                    return;
                }
                guard = lock.lock_owned() => Some(guard),
            },
            None => None,
        };

        if cancel.is_cancelled() {
            result.transition(BuildState::Cancelled, "build cancelled");
            return;
        }

        let command_line = self.command_line();
        if !result.transition(
            BuildState::Running,
            format!("build started: {}", command_line),
        ) {
            return;
        }
        self.progress.on_event(&BuildEvent::Started {
            id: self.id,
            command: command_line,
        });

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(build = %self.id, program = %self.program, error = %e, "Failed to spawn build tool");
                result.transition(
                    BuildState::Failed,
                    format!("build failed: could not start `{}`: {}", self.program, e),
                );
                return;
            }
        };

        let mut readers = JoinSet::new();
        if let Some(stdout) = child.stdout.take() {
            readers.spawn(pump_lines(stdout, result.clone(), self.output_sink()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.spawn(pump_lines(stderr, result.clone(), self.output_sink()));
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                terminate(&mut child, self.grace_period).await;
                readers.abort_all();
                result.transition(BuildState::Cancelled, "build cancelled");
                return;
            }
            status = child.wait() => status,
        };

        // The terminal line must come after every output line. Background
        // processes the tool left behind may hold the pipes open, so the wait
        // for EOF is bounded by the grace period.
        let drained = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                readers.abort_all();
                result.transition(BuildState::Cancelled, "build cancelled");
                return;
            }
            drained = tokio::time::timeout(self.grace_period, drain(&mut readers)) => drained.is_ok(),
        };
        if !drained {
            warn!(
                build = %self.id,
                grace_ms = self.grace_period.as_millis() as u64,
                "Output pipes still open after the build tool exited, detaching"
            );
            readers.abort_all();
        }

        match status {
            Ok(status) if status.success() => {
                result.transition(BuildState::Succeeded, "build succeeded");
            }
            Ok(status) => {
                result.transition(
                    BuildState::Failed,
                    format!("build failed: {}", describe_exit(&self.program, status)),
                );
            }
            Err(e) => {
                result.transition(
                    BuildState::Failed,
                    format!("build failed: could not wait for `{}`: {}", self.program, e),
                );
            }
        }
    }

    fn spawn(&self) -> std::io::Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(self.flags.iter())
            .current_dir(self.project.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so cancellation reaches the tool's children too.
        #[cfg(unix)]
        command.process_group(0);

        debug!(build = %self.id, command = %self.command_line(), "Spawning build tool");
        command.spawn()
    }

    fn output_sink(&self) -> OutputSink {
        OutputSink {
            id: self.id,
            progress: Arc::clone(&self.progress),
        }
    }
}

struct OutputSink {
    id: Uuid,
    progress: Arc<dyn ProgressHandler>,
}

/// Copies lines from a pipe into the log. Invalid UTF-8 is replaced, never
/// fatal, so the pipe keeps draining and the tool never blocks on a full pipe.
async fn pump_lines<R>(reader: R, result: BuildResult, sink: OutputSink)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(|c: char| c == '\n' || c == '\r')
                    .to_string();
                if result.append(line.clone()) {
                    sink.progress.on_event(&BuildEvent::Output { id: sink.id, line });
                }
            }
            Err(e) => {
                debug!(build = %sink.id, error = %e, "Output pipe closed with error");
                break;
            }
        }
    }
}

async fn drain(readers: &mut JoinSet<()>) {
    while readers.join_next().await.is_some() {}
}

/// SIGTERM, then SIGKILL after `grace_period`.
async fn terminate(child: &mut Child, grace_period: Duration) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            signal_group(pid, libc::SIGTERM);
            if tokio::time::timeout(grace_period, child.wait()).await.is_ok() {
                return;
            }
            warn!(pid, grace_ms = grace_period.as_millis() as u64, "Build tool ignored SIGTERM, killing");
            signal_group(pid, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = grace_period;

    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill build tool");
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions. The child was
    // spawned as leader of process group `pgid` and has not been reaped.
    let rc = unsafe { libc::kill(-pgid, signal) };
    if rc != 0 {
        debug!(pid, signal, error = %std::io::Error::last_os_error(), "kill failed");
    }
}

fn describe_exit(program: &str, status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("`{}` exited with code {}", program, code),
        None => format!("`{}` terminated ({})", program, status),
    }
}

async fn persist_log(dir: &Path, snapshot: &BuildSnapshot) {
    let path = dir.join(format!("{}.log", snapshot.id));
    let mut contents = snapshot.log.join("\n");
    contents.push('\n');

    let written: std::io::Result<()> = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, contents).await
    }
    .await;

    match written {
        Ok(()) => debug!(build = %snapshot.id, path = %path.display(), "Build log persisted"),
        Err(e) => warn!(build = %snapshot.id, path = %path.display(), error = %e, "Failed to persist build log"),
    }
}
