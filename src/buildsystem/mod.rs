//! Build system definitions
//!
//! A build system knows which descriptor files mark a project (detection),
//! how to turn a project and a source file into tool arguments (flag
//! resolution), and which program runs the build.

mod id;

pub mod cmake;
pub mod make;
pub mod meson;
pub mod registry;

pub use cmake::CMakeBuildSystem;
pub use id::BuildSystemId;
pub use make::MakeBuildSystem;
pub use meson::MesonBuildSystem;
pub use registry::BuildSystemRegistry;

use crate::flags::{normalize_path, BuildFlags, BuildSettings, ResolutionError};
use crate::fs::{FileSystem, FileType};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A detected project. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    root: PathBuf,
    descriptor: PathBuf,
    priority: i32,
    build_system: BuildSystemId,
}

impl Project {
    /// Project rooted at the descriptor's parent directory.
    ///
    /// Returns `None` when the descriptor has no parent.
    pub fn from_descriptor(
        build_system: BuildSystemId,
        descriptor: impl Into<PathBuf>,
        priority: i32,
    ) -> Option<Self> {
        let descriptor = descriptor.into();
        let root = descriptor.parent()?.to_path_buf();

        Some(Self {
            root,
            descriptor,
            priority,
            build_system,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor(&self) -> &Path {
        &self.descriptor
    }

    /// Lower values win when several detectors claim the same path
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn build_system(&self) -> &BuildSystemId {
        &self.build_system
    }
}

/// Recognizes a project from a path.
pub trait ProjectDetector: Send + Sync {
    fn id(&self) -> BuildSystemId;

    /// Exact descriptor file names (e.g. "CMakeLists.txt")
    fn descriptor_names(&self) -> &[&'static str];

    /// Detection order; lower is tried first
    fn priority(&self) -> i32;

    /// A descriptor file yields a project rooted at its parent. A directory
    /// yields a project only if exactly one descriptor sits at its top level.
    /// Anything else is `None`, which is an expected outcome rather than an
    /// error.
    fn detect(&self, path: &Path, fs: &dyn FileSystem) -> Option<Project> {
        let path = normalize_path(path).ok()?;

        match fs.file_type(&path)? {
            FileType::File => {
                let name = path.file_name()?.to_str()?;
                if !self.descriptor_names().contains(&name) {
                    return None;
                }
                Project::from_descriptor(self.id(), path, self.priority())
            }
            FileType::Directory => {
                let descriptor = single_descriptor(&path, self.descriptor_names(), fs)?;
                Project::from_descriptor(self.id(), descriptor, self.priority())
            }
            FileType::Other => None,
        }
    }
}

/// Computes tool arguments for a source file. Must be a pure function of its
/// inputs.
pub trait FlagResolver: Send + Sync {
    fn resolve_flags(
        &self,
        project: &Project,
        source: &Path,
        settings: &BuildSettings,
    ) -> Result<BuildFlags, ResolutionError>;
}

pub trait BuildSystem: ProjectDetector + FlagResolver {
    /// Default build tool program
    fn tool(&self) -> &str;
}

fn single_descriptor(dir: &Path, names: &[&str], fs: &dyn FileSystem) -> Option<PathBuf> {
    let mut found = names
        .iter()
        .map(|name| dir.join(name))
        .filter(|candidate| fs.is_file(candidate));

    let descriptor = found.next()?;
    if let Some(other) = found.next() {
        debug!(
            dir = %dir.display(),
            first = %descriptor.display(),
            second = %other.display(),
            "Ambiguous descriptors, skipping"
        );
        return None;
    }
    Some(descriptor)
}
