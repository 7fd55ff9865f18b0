//! Orchestrator configuration
//!
//! Settings are read from `BUILDORCH_*` environment variables with sensible
//! defaults. Unparsable values fall back to the default; `validate` enforces
//! ranges.

use crate::build::DEFAULT_GRACE_PERIOD;
use crate::flags::BuildSettings;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_CONCURRENT_BUILDS: usize = 256;
const MAX_GRACE_PERIOD: Duration = Duration::from_secs(600);
const MAX_JOBS: usize = 1024;

/// Whether builds of the same project may overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectPolicy {
    #[default]
    Concurrent,
    /// One build per project root at a time; later builds stay pending
    Serialized,
}

impl ProjectPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "concurrent" => Some(ProjectPolicy::Concurrent),
            "serialized" | "serialised" => Some(ProjectPolicy::Serialized),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectPolicy::Concurrent => write!(f, "concurrent"),
            ProjectPolicy::Serialized => write!(f, "serialized"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// `None` means unbounded
    pub max_concurrent_builds: Option<usize>,
    pub cancel_grace_period: Duration,
    pub project_policy: ProjectPolicy,
    pub settings: BuildSettings,
    /// Where terminal build logs are written, if anywhere
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let defaults = BuildSettings::default();

        let settings = BuildSettings {
            build_dir: env_string("BUILDORCH_BUILD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.build_dir),
            build_type: env_string("BUILDORCH_BUILD_TYPE").unwrap_or(defaults.build_type),
            jobs: env_parse::<usize>("BUILDORCH_JOBS"),
            tool: env_string("BUILDORCH_TOOL"),
        };

        let project_policy = env::var("BUILDORCH_PROJECT_POLICY")
            .ok()
            .and_then(|v| ProjectPolicy::from_name(&v))
            .unwrap_or_default();

        let cancel_grace_period = env_parse::<u64>("BUILDORCH_CANCEL_GRACE_MS")
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_GRACE_PERIOD);

        let log_level = env::var("BUILDORCH_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            max_concurrent_builds: env_parse::<usize>("BUILDORCH_MAX_CONCURRENT_BUILDS"),
            cancel_grace_period,
            project_policy,
            settings,
            log_dir: env_string("BUILDORCH_LOG_DIR").map(PathBuf::from),
            log_level,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.max_concurrent_builds {
            if max == 0 {
                return Err(ConfigError::ValidationFailed(
                    "Max concurrent builds must be at least 1".to_string(),
                ));
            }
            if max > MAX_CONCURRENT_BUILDS {
                return Err(ConfigError::ValidationFailed(format!(
                    "Max concurrent builds cannot exceed {}",
                    MAX_CONCURRENT_BUILDS
                )));
            }
        }

        if self.cancel_grace_period > MAX_GRACE_PERIOD {
            return Err(ConfigError::ValidationFailed(
                "Cancel grace period cannot exceed 10 minutes".to_string(),
            ));
        }

        let build_dir = &self.settings.build_dir;
        if build_dir.as_os_str().is_empty() || build_dir.is_absolute() {
            return Err(ConfigError::ValidationFailed(format!(
                "Build directory must be a non-empty relative path, got {:?}",
                build_dir
            )));
        }

        if self.settings.build_type.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Build type cannot be empty".to_string(),
            ));
        }

        if let Some(jobs) = self.settings.jobs {
            if jobs == 0 || jobs > MAX_JOBS {
                return Err(ConfigError::ValidationFailed(format!(
                    "Jobs must be between 1 and {}",
                    MAX_JOBS
                )));
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}

impl fmt::Display for OrchestratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Orchestrator Configuration:")?;
        match self.max_concurrent_builds {
            Some(max) => writeln!(f, "  Max Concurrent Builds: {}", max)?,
            None => writeln!(f, "  Max Concurrent Builds: unbounded")?,
        }
        writeln!(
            f,
            "  Cancel Grace Period: {}ms",
            self.cancel_grace_period.as_millis()
        )?;
        writeln!(f, "  Project Policy: {}", self.project_policy)?;
        writeln!(f, "  Build Dir: {}", self.settings.build_dir.display())?;
        writeln!(f, "  Build Type: {}", self.settings.build_type)?;
        if let Some(jobs) = self.settings.jobs {
            writeln!(f, "  Jobs: {}", jobs)?;
        }
        if let Some(ref tool) = self.settings.tool {
            writeln!(f, "  Tool Override: {}", tool)?;
        }
        if let Some(ref dir) = self.log_dir {
            writeln!(f, "  Log Dir: {}", dir.display())?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn clean_env() -> Vec<EnvGuard> {
        [
            "BUILDORCH_MAX_CONCURRENT_BUILDS",
            "BUILDORCH_CANCEL_GRACE_MS",
            "BUILDORCH_PROJECT_POLICY",
            "BUILDORCH_BUILD_DIR",
            "BUILDORCH_BUILD_TYPE",
            "BUILDORCH_JOBS",
            "BUILDORCH_TOOL",
            "BUILDORCH_LOG_DIR",
            "BUILDORCH_LOG_LEVEL",
        ]
        .into_iter()
        .map(EnvGuard::unset)
        .collect()
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = clean_env();

        let config = OrchestratorConfig::default();

        assert_eq!(config.max_concurrent_builds, None);
        assert_eq!(config.cancel_grace_period, DEFAULT_GRACE_PERIOD);
        assert_eq!(config.project_policy, ProjectPolicy::Concurrent);
        assert_eq!(config.settings, BuildSettings::default());
        assert_eq!(config.log_dir, None);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _clean = clean_env();
        let _guards = [
            EnvGuard::set("BUILDORCH_MAX_CONCURRENT_BUILDS", "4"),
            EnvGuard::set("BUILDORCH_CANCEL_GRACE_MS", "250"),
            EnvGuard::set("BUILDORCH_PROJECT_POLICY", "Serialized"),
            EnvGuard::set("BUILDORCH_BUILD_DIR", "out"),
            EnvGuard::set("BUILDORCH_BUILD_TYPE", "Release"),
            EnvGuard::set("BUILDORCH_JOBS", "8"),
            EnvGuard::set("BUILDORCH_TOOL", "/opt/cmake/bin/cmake"),
            EnvGuard::set("BUILDORCH_LOG_DIR", "/tmp/build-logs"),
            EnvGuard::set("BUILDORCH_LOG_LEVEL", "DEBUG"),
        ];

        let config = OrchestratorConfig::default();

        assert_eq!(config.max_concurrent_builds, Some(4));
        assert_eq!(config.cancel_grace_period, Duration::from_millis(250));
        assert_eq!(config.project_policy, ProjectPolicy::Serialized);
        assert_eq!(config.settings.build_dir, PathBuf::from("out"));
        assert_eq!(config.settings.build_type, "Release");
        assert_eq!(config.settings.jobs, Some(8));
        assert_eq!(config.settings.tool.as_deref(), Some("/opt/cmake/bin/cmake"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/build-logs")));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_unparsable_values_fall_back() {
        let _clean = clean_env();
        let _guards = [
            EnvGuard::set("BUILDORCH_JOBS", "many"),
            EnvGuard::set("BUILDORCH_PROJECT_POLICY", "sometimes"),
            EnvGuard::set("BUILDORCH_BUILD_DIR", "  "),
        ];

        let config = OrchestratorConfig::default();

        assert_eq!(config.settings.jobs, None);
        assert_eq!(config.project_policy, ProjectPolicy::Concurrent);
        assert_eq!(config.settings.build_dir, PathBuf::from("build"));
    }

    #[test]
    #[serial]
    fn test_validation_rejects_zero_concurrency() {
        let config = OrchestratorConfig {
            max_concurrent_builds: Some(0),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    #[serial]
    fn test_validation_rejects_absolute_build_dir() {
        let mut config = OrchestratorConfig {
            log_level: "info".to_string(),
            ..Default::default()
        };
        config.settings.build_dir = PathBuf::from("/abs/build");
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_validation_rejects_invalid_log_level() {
        let config = OrchestratorConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_validation_rejects_long_grace_period() {
        let config = OrchestratorConfig {
            cancel_grace_period: Duration::from_secs(3600),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_project_policy_names() {
        assert_eq!(
            ProjectPolicy::from_name("concurrent"),
            Some(ProjectPolicy::Concurrent)
        );
        assert_eq!(
            ProjectPolicy::from_name("SERIALIZED"),
            Some(ProjectPolicy::Serialized)
        );
        assert_eq!(ProjectPolicy::from_name("nope"), None);
        assert_eq!(ProjectPolicy::Serialized.to_string(), "serialized");
    }

    #[test]
    #[serial]
    fn test_display() {
        let _guards = clean_env();
        let output = OrchestratorConfig::default().to_string();
        assert!(output.contains("Max Concurrent Builds: unbounded"));
        assert!(output.contains("Build Type: Debug"));
    }
}
