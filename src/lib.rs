//! buildorch - build system detection and cancellable build execution
//!
//! Given a path, buildorch finds the build system that governs it (CMake,
//! Meson or Make out of the box), resolves the tool arguments needed to
//! build a source file in that project and runs the build asynchronously.
//! Each build reports through a shared, observable result that moves from
//! `pending` through `running` to exactly one terminal state.
//!
//! # Example Usage
//!
//! ```no_run
//! use buildorch::{BuildState, Orchestrator, OrchestratorConfig};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(OrchestratorConfig::default())?;
//! let handle = orchestrator.build(Path::new("/proj"), Path::new("/proj/main.c"))?;
//!
//! let snapshot = handle.wait().await;
//! if snapshot.state == BuildState::Failed {
//!     for line in &snapshot.log {
//!         eprintln!("{}", line);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`buildsystem`]: detectors and flag resolvers per build system
//! - [`flags`]: build arguments and source path checks
//! - [`build`]: build tasks, results and cancellation
//! - [`orchestrator`]: the façade tying detection, flags and builds together

pub mod build;
pub mod buildsystem;
pub mod cli;
pub mod config;
pub mod flags;
pub mod fs;
pub mod orchestrator;
pub mod progress;
pub mod util;

pub use build::{BuildHandle, BuildResult, BuildSnapshot, BuildState, BuildTask, CancelToken};
pub use buildsystem::{
    BuildSystem, BuildSystemId, BuildSystemRegistry, FlagResolver, Project, ProjectDetector,
};
pub use config::{ConfigError, OrchestratorConfig, ProjectPolicy};
pub use flags::{BuildFlags, BuildSettings, ResolutionError};
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
