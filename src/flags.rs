//! Build flag types and source-tree membership checks
//!
//! Flags are an ordered list of arguments handed to the build tool. They are
//! recomputed on every request and never cached.

use crate::buildsystem::Project;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

const DEFAULT_BUILD_DIR: &str = "build";
const DEFAULT_BUILD_TYPE: &str = "Debug";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("{file} is not part of the project rooted at {root}")]
    OutsideProject { file: PathBuf, root: PathBuf },

    #[error("{0} is the project root, not a source file")]
    NotASourceFile(PathBuf),

    #[error("cannot resolve path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("no flag resolver registered for build system {0}")]
    UnknownBuildSystem(String),
}

/// Ordered build tool arguments for one (project, source file) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildFlags(Vec<String>);

impl BuildFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flag: impl Into<String>) {
        self.0.push(flag.into());
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for BuildFlags {
    fn from(flags: Vec<String>) -> Self {
        Self(flags)
    }
}

impl<'a> IntoIterator for &'a BuildFlags {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for BuildFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// Per-deployment build settings the resolvers fold into the flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Build directory, relative to the project root
    pub build_dir: PathBuf,
    pub build_type: String,
    pub jobs: Option<usize>,
    /// Replaces the build system's default tool program
    pub tool: Option<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            build_type: DEFAULT_BUILD_TYPE.to_string(),
            jobs: None,
            tool: None,
        }
    }
}

impl BuildSettings {
    pub fn build_dir_in(&self, project: &Project) -> PathBuf {
        project.root().join(&self.build_dir)
    }
}

/// Makes `path` absolute against the current directory and folds `.` and `..`
/// without touching the file system.
///
/// Symlinks are not resolved, so the same file can normalize to two different
/// paths. [`source_in_project`] falls back to resolved paths when the lexical
/// forms disagree.
pub fn normalize_path(path: &Path) -> Result<PathBuf, ResolutionError> {
    let absolute = std::path::absolute(path).map_err(|e| ResolutionError::InvalidPath {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Path of `source` relative to the project root.
///
/// Fails when the source lies outside the root or names the root itself.
/// When the lexical paths disagree and both the root and the source exist,
/// membership is decided on their canonical paths, so a project reached
/// through a symlink still owns sources named by their real path.
pub fn source_in_project(project: &Project, source: &Path) -> Result<PathBuf, ResolutionError> {
    let source = normalize_path(source)?;

    let relative = match source.strip_prefix(project.root()) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => canonical_relative(project.root(), &source).ok_or_else(|| {
            ResolutionError::OutsideProject {
                file: source.clone(),
                root: project.root().to_path_buf(),
            }
        })?,
    };

    if relative.as_os_str().is_empty() {
        return Err(ResolutionError::NotASourceFile(source));
    }
    Ok(relative)
}

fn canonical_relative(root: &Path, source: &Path) -> Option<PathBuf> {
    let root = std::fs::canonicalize(root).ok()?;
    let source = std::fs::canonicalize(source).ok()?;
    source.strip_prefix(&root).ok().map(Path::to_path_buf)
}
