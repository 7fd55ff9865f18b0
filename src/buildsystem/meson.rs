//! Meson build system

use super::{BuildSystem, BuildSystemId, FlagResolver, Project, ProjectDetector};
use crate::flags::{source_in_project, BuildFlags, BuildSettings, ResolutionError};
use std::path::Path;

pub struct MesonBuildSystem;

impl ProjectDetector for MesonBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Meson
    }

    fn descriptor_names(&self) -> &[&'static str] {
        &["meson.build"]
    }

    fn priority(&self) -> i32 {
        15
    }
}

impl FlagResolver for MesonBuildSystem {
    fn resolve_flags(
        &self,
        project: &Project,
        source: &Path,
        settings: &BuildSettings,
    ) -> Result<BuildFlags, ResolutionError> {
        source_in_project(project, source)?;

        let mut flags = BuildFlags::new();
        flags.push("compile");
        flags.push("-C");
        flags.push(settings.build_dir_in(project).to_string_lossy());
        if let Some(jobs) = settings.jobs {
            flags.push("-j");
            flags.push(jobs.to_string());
        }
        Ok(flags)
    }
}

impl BuildSystem for MesonBuildSystem {
    fn tool(&self) -> &str {
        "meson"
    }
}
