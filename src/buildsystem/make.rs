//! Make build system

use super::{BuildSystem, BuildSystemId, FlagResolver, Project, ProjectDetector};
use crate::flags::{source_in_project, BuildFlags, BuildSettings, ResolutionError};
use std::path::Path;

pub struct MakeBuildSystem;

impl ProjectDetector for MakeBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Make
    }

    // Lowercase "makefile" is left out: on case-insensitive file systems it
    // would alias "Makefile" and make every directory ambiguous.
    fn descriptor_names(&self) -> &[&'static str] {
        &["GNUmakefile", "Makefile"]
    }

    fn priority(&self) -> i32 {
        20
    }
}

impl FlagResolver for MakeBuildSystem {
    /// Targets the object file of the source (`src/main.c` -> `src/main.o`).
    fn resolve_flags(
        &self,
        project: &Project,
        source: &Path,
        settings: &BuildSettings,
    ) -> Result<BuildFlags, ResolutionError> {
        let relative = source_in_project(project, source)?;

        let mut flags = BuildFlags::new();
        flags.push("-C");
        flags.push(project.root().to_string_lossy());
        if let Some(jobs) = settings.jobs {
            flags.push(format!("-j{}", jobs));
        }
        if relative.extension().is_some() {
            flags.push(relative.with_extension("o").to_string_lossy());
        }
        Ok(flags)
    }
}

impl BuildSystem for MakeBuildSystem {
    fn tool(&self) -> &str {
        "make"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn project() -> Project {
        Project::from_descriptor(BuildSystemId::Make, "/src/app/Makefile", 20).unwrap()
    }

    #[test]
    fn test_detect_gnumakefile() {
        let fs = MockFileSystem::with_root("/src/app".into());
        fs.add_file("GNUmakefile");

        let project = MakeBuildSystem.detect(Path::new("/src/app"), &fs).unwrap();
        assert_eq!(project.descriptor(), Path::new("/src/app/GNUmakefile"));
    }

    #[test]
    fn test_both_makefiles_are_ambiguous() {
        let fs = MockFileSystem::with_root("/src/app".into());
        fs.add_file("GNUmakefile");
        fs.add_file("Makefile");

        assert!(MakeBuildSystem.detect(Path::new("/src/app"), &fs).is_none());
    }

    #[test]
    fn test_resolve_object_target() {
        let settings = BuildSettings {
            jobs: Some(4),
            ..BuildSettings::default()
        };
        let flags = MakeBuildSystem
            .resolve_flags(&project(), Path::new("/src/app/src/main.c"), &settings)
            .unwrap();
        assert_eq!(flags.as_slice(), ["-C", "/src/app", "-j4", "src/main.o"]);
    }

    #[test]
    fn test_extensionless_source_builds_default_target() {
        let flags = MakeBuildSystem
            .resolve_flags(
                &project(),
                Path::new("/src/app/README"),
                &BuildSettings::default(),
            )
            .unwrap();
        assert_eq!(flags.as_slice(), ["-C", "/src/app"]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let settings = BuildSettings::default();
        let first = MakeBuildSystem
            .resolve_flags(&project(), Path::new("/src/app/a/b.cpp"), &settings)
            .unwrap();
        let second = MakeBuildSystem
            .resolve_flags(&project(), Path::new("/src/app/a/b.cpp"), &settings)
            .unwrap();
        assert_eq!(first, second);
    }
}
