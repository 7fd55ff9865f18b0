//! Orchestrator façade
//!
//! Composes detection, flag resolution and build execution:
//! `build(path, source)` picks the project's build system, resolves flags
//! and starts a cancellable build, returning its handle without waiting.

use crate::build::{BuildHandle, BuildSnapshot, BuildTask, CancelToken};
use crate::buildsystem::{BuildSystem, BuildSystemRegistry, Project};
use crate::config::{ConfigError, OrchestratorConfig, ProjectPolicy};
use crate::flags::{BuildFlags, ResolutionError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::progress::{BuildEvent, LoggingHandler, ProgressHandler};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no build system found for {0}")]
    NoBuildSystemFound(PathBuf),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("builds must be started from within a tokio runtime")]
    NoRuntime,
}

pub struct Orchestrator {
    registry: BuildSystemRegistry,
    fs: Arc<dyn FileSystem>,
    config: OrchestratorConfig,
    progress: Arc<dyn ProgressHandler>,
    limiter: Option<Arc<Semaphore>>,
    /// Only roots with a build holding the lock stay alive
    project_locks: Mutex<HashMap<PathBuf, Weak<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    /// Default build systems, the real file system and tracing-based progress.
    ///
    /// Fails when `config` does not pass [`OrchestratorConfig::validate`].
    pub fn new(config: OrchestratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let limiter = config
            .max_concurrent_builds
            .map(|max| Arc::new(Semaphore::new(max)));

        Ok(Self {
            registry: BuildSystemRegistry::with_defaults(),
            fs: Arc::new(RealFileSystem::new()),
            config,
            progress: Arc::new(LoggingHandler),
            limiter,
            project_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_registry(mut self, registry: BuildSystemRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn registry(&self) -> &BuildSystemRegistry {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Best-ranked project for `path`, if any build system recognizes it.
    pub fn detect(&self, path: &Path) -> Option<Project> {
        self.select(path).map(|(project, _)| project)
    }

    pub fn resolve_flags(
        &self,
        project: &Project,
        source: &Path,
    ) -> Result<BuildFlags, OrchestratorError> {
        let build_system = self.registry.get(project.build_system()).ok_or_else(|| {
            ResolutionError::UnknownBuildSystem(project.build_system().to_string())
        })?;
        Ok(build_system.resolve_flags(project, source, &self.config.settings)?)
    }

    pub fn build(&self, path: &Path, source: &Path) -> Result<BuildHandle, OrchestratorError> {
        self.build_with_cancel(path, source, CancelToken::new())
    }

    /// Like [`Orchestrator::build`], observing a caller-owned cancel token.
    ///
    /// Detection and flag errors are returned before anything starts. Once a
    /// handle is returned, every failure ends up in its result instead.
    pub fn build_with_cancel(
        &self,
        path: &Path,
        source: &Path,
        cancel: CancelToken,
    ) -> Result<BuildHandle, OrchestratorError> {
        let runtime = Handle::try_current().map_err(|_| OrchestratorError::NoRuntime)?;

        let (project, build_system) = self
            .select(path)
            .ok_or_else(|| OrchestratorError::NoBuildSystemFound(path.to_path_buf()))?;
        let flags = build_system.resolve_flags(&project, source, &self.config.settings)?;

        let program = self
            .config
            .settings
            .tool
            .clone()
            .unwrap_or_else(|| build_system.tool().to_string());

        let project = Arc::new(project);
        let mut task = BuildTask::new(Arc::clone(&project), flags, program)
            .with_grace_period(self.config.cancel_grace_period)
            .with_progress(Arc::clone(&self.progress));

        if let Some(limiter) = &self.limiter {
            task = task.with_limiter(Arc::clone(limiter));
        }
        if self.config.project_policy == ProjectPolicy::Serialized {
            task = task.with_project_lock(self.project_lock(project.root()));
        }
        if let Some(dir) = &self.config.log_dir {
            task = task.with_log_dir(dir);
        }

        info!(
            build = %task.id(),
            root = %project.root().display(),
            source = %source.display(),
            "Starting build"
        );
        Ok(task.start_on(&runtime, cancel))
    }

    pub fn cancel(&self, handle: &BuildHandle) {
        debug!(build = %handle.id(), "Cancel requested");
        handle.cancel();
    }

    pub fn poll(&self, handle: &BuildHandle) -> BuildSnapshot {
        handle.snapshot()
    }

    fn select(&self, path: &Path) -> Option<(Project, Arc<dyn BuildSystem>)> {
        let selected = self.registry.detect(path, self.fs.as_ref());
        if let Some((project, _)) = &selected {
            self.progress.on_event(&BuildEvent::Detected {
                root: project.root().to_path_buf(),
                build_system: project.build_system().clone(),
            });
        }
        selected
    }

    fn project_lock(&self, root: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.project_locks.lock();
        locks.retain(|_, lock| lock.strong_count() > 0);

        if let Some(lock) = locks.get(root).and_then(Weak::upgrade) {
            return lock;
        }
        let lock = Arc::new(tokio::sync::Mutex::new(()));
        locks.insert(root.to_path_buf(), Arc::downgrade(&lock));
        lock
    }
}
