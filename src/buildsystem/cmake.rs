//! CMake build system

use super::{BuildSystem, BuildSystemId, FlagResolver, Project, ProjectDetector};
use crate::flags::{source_in_project, BuildFlags, BuildSettings, ResolutionError};
use std::path::Path;

pub struct CMakeBuildSystem;

impl ProjectDetector for CMakeBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::CMake
    }

    fn descriptor_names(&self) -> &[&'static str] {
        &["CMakeLists.txt"]
    }

    fn priority(&self) -> i32 {
        10
    }
}

impl FlagResolver for CMakeBuildSystem {
    /// `cmake --build` drives the whole configured tree, so the source file
    /// only has to belong to the project.
    fn resolve_flags(
        &self,
        project: &Project,
        source: &Path,
        settings: &BuildSettings,
    ) -> Result<BuildFlags, ResolutionError> {
        source_in_project(project, source)?;

        let mut flags = BuildFlags::new();
        flags.push("--build");
        flags.push(settings.build_dir_in(project).to_string_lossy());
        flags.push("--config");
        flags.push(settings.build_type.as_str());
        if let Some(jobs) = settings.jobs {
            flags.push("--parallel");
            flags.push(jobs.to_string());
        }
        Ok(flags)
    }
}

impl BuildSystem for CMakeBuildSystem {
    fn tool(&self) -> &str {
        "cmake"
    }
}
