use super::{BuildSystem, BuildSystemId, CMakeBuildSystem, MakeBuildSystem, MesonBuildSystem, Project};
use crate::fs::FileSystem;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Ordered set of build systems.
///
/// Registration order is the tie-breaker when two detectors report the same
/// priority: the earlier registration wins.
pub struct BuildSystemRegistry {
    build_systems: Vec<Arc<dyn BuildSystem>>,
}

impl BuildSystemRegistry {
    pub fn new() -> Self {
        Self {
            build_systems: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CMakeBuildSystem));
        registry.register(Arc::new(MesonBuildSystem));
        registry.register(Arc::new(MakeBuildSystem));
        registry
    }

    /// Adds a build system. Registering an id that is already present
    /// replaces the old entry in place, keeping its position.
    pub fn register(&mut self, build_system: Arc<dyn BuildSystem>) {
        let id = build_system.id();
        match self.build_systems.iter_mut().find(|bs| bs.id() == id) {
            Some(existing) => *existing = build_system,
            None => self.build_systems.push(build_system),
        }
    }

    pub fn get(&self, id: &BuildSystemId) -> Option<&Arc<dyn BuildSystem>> {
        self.build_systems.iter().find(|bs| &bs.id() == id)
    }

    pub fn all(&self) -> &[Arc<dyn BuildSystem>] {
        &self.build_systems
    }

    pub fn is_empty(&self) -> bool {
        self.build_systems.is_empty()
    }

    /// Queries every detector and keeps the lowest-priority match.
    pub fn detect(
        &self,
        path: &Path,
        fs: &dyn FileSystem,
    ) -> Option<(Project, Arc<dyn BuildSystem>)> {
        let selected = self
            .build_systems
            .iter()
            .filter_map(|bs| {
                let project = bs.detect(path, fs)?;
                debug!(
                    build_system = %project.build_system(),
                    priority = project.priority(),
                    root = %project.root().display(),
                    "Detector matched"
                );
                Some((project, Arc::clone(bs)))
            })
            // min_by_key keeps the first of equal minima
            .min_by_key(|(project, _)| project.priority());

        if selected.is_none() {
            debug!(path = %path.display(), "No detector matched");
        }
        selected
    }
}

impl Default for BuildSystemRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
