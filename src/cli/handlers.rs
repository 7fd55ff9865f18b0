//! Command handlers
//!
//! Each handler returns the process exit code: 0 on success, 1 when a build
//! failed or nothing was detected, 2 when the request itself was invalid and
//! 130 when a build was cancelled.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::commands::{BuildArgs, DetectArgs, FlagsArgs, HealthArgs, SettingsArgs};
use super::output::{OutputFormat, OutputFormatter, ToolHealth};
use crate::build::{BuildSnapshot, BuildState, CancelToken};
use crate::config::OrchestratorConfig;
use crate::flags::normalize_path;
use crate::orchestrator::{Orchestrator, OrchestratorError};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_CANCELLED: i32 = 130;

pub fn exit_code_for(state: BuildState) -> i32 {
    match state {
        BuildState::Succeeded => EXIT_SUCCESS,
        BuildState::Cancelled => EXIT_CANCELLED,
        BuildState::Failed | BuildState::Pending | BuildState::Running => EXIT_FAILURE,
    }
}

fn apply_settings(config: &mut OrchestratorConfig, args: &SettingsArgs) {
    if let Some(build_dir) = &args.build_dir {
        config.settings.build_dir = build_dir.clone();
    }
    if let Some(build_type) = &args.build_type {
        config.settings.build_type = build_type.clone();
    }
    if args.jobs.is_some() {
        config.settings.jobs = args.jobs;
    }
}

fn orchestrator_for(config: OrchestratorConfig) -> Result<Orchestrator, i32> {
    debug!("Configuration: {}", config);
    Orchestrator::new(config).map_err(|e| {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your BUILDORCH_* environment variables and command-line arguments.");
        EXIT_USAGE
    })
}

fn absolute(path: &Path) -> Result<PathBuf, i32> {
    normalize_path(path).map_err(|e| {
        error!("Invalid path {}: {}", path.display(), e);
        EXIT_USAGE
    })
}

fn print(output: anyhow::Result<String>) -> i32 {
    match output {
        Ok(output) => {
            println!("{}", output);
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("Failed to format output: {}", e);
            EXIT_FAILURE
        }
    }
}

fn report_orchestrator_error(e: &OrchestratorError) {
    error!("{}", e);
    if let OrchestratorError::NoBuildSystemFound(_) = e {
        eprintln!("\nExpected one of CMakeLists.txt, meson.build or Makefile in the project directory.");
        eprintln!("Run 'buildorch detect <PATH>' to see what is recognized.");
    }
}

pub async fn handle_detect(args: &DetectArgs) -> i32 {
    let path = match &args.path {
        Some(path) => path.clone(),
        None => match env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error!("Failed to read current directory: {}", e);
                return EXIT_USAGE;
            }
        },
    };
    let path = match absolute(&path) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let orchestrator = match orchestrator_for(OrchestratorConfig::default()) {
        Ok(orchestrator) => orchestrator,
        Err(code) => return code,
    };

    match orchestrator.detect(&path) {
        Some(project) => {
            info!(
                build_system = %project.build_system(),
                root = %project.root().display(),
                "Detected project"
            );
            print(OutputFormatter::new(args.format.into()).format_project(&project))
        }
        None => {
            warn!("No build system found for {}", path.display());
            if OutputFormat::from(args.format) == OutputFormat::Json {
                println!("null");
            }
            EXIT_FAILURE
        }
    }
}

pub async fn handle_flags(args: &FlagsArgs) -> i32 {
    let (path, source) = match (absolute(&args.path), absolute(&args.source)) {
        (Ok(path), Ok(source)) => (path, source),
        (Err(code), _) | (_, Err(code)) => return code,
    };

    let mut config = OrchestratorConfig::default();
    apply_settings(&mut config, &args.settings);
    let orchestrator = match orchestrator_for(config) {
        Ok(orchestrator) => orchestrator,
        Err(code) => return code,
    };

    let Some(project) = orchestrator.detect(&path) else {
        report_orchestrator_error(&OrchestratorError::NoBuildSystemFound(path));
        return EXIT_USAGE;
    };

    match orchestrator.resolve_flags(&project, &source) {
        Ok(flags) => {
            print(OutputFormatter::new(args.format.into()).format_flags(&project, &source, &flags))
        }
        Err(e) => {
            report_orchestrator_error(&e);
            EXIT_USAGE
        }
    }
}

/// Resolves when the deadline passes; never resolves without one.
async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

pub async fn handle_build(args: &BuildArgs) -> i32 {
    let (path, source) = match (absolute(&args.path), absolute(&args.source)) {
        (Ok(path), Ok(source)) => (path, source),
        (Err(code), _) | (_, Err(code)) => return code,
    };

    let mut config = OrchestratorConfig::default();
    apply_settings(&mut config, &args.settings);
    if let Some(tool) = &args.tool {
        config.settings.tool = Some(tool.clone());
    }
    let orchestrator = match orchestrator_for(config) {
        Ok(orchestrator) => orchestrator,
        Err(code) => return code,
    };

    let cancel = CancelToken::new();
    let handle = match orchestrator.build_with_cancel(&path, &source, cancel.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            report_orchestrator_error(&e);
            return EXIT_USAGE;
        }
    };
    info!(build = %handle.id(), "Build submitted");

    let snapshot: BuildSnapshot = tokio::select! {
        snapshot = handle.wait() => snapshot,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling build {}", handle.id());
            orchestrator.cancel(&handle);
            handle.wait().await
        }
        _ = deadline(args.timeout.map(Duration::from_secs)) => {
            warn!("Build {} timed out, cancelling", handle.id());
            cancel.cancel();
            handle.wait().await
        }
    };

    let code = print(OutputFormatter::new(args.format.into()).format_snapshot(&snapshot));
    if code != EXIT_SUCCESS {
        return code;
    }
    exit_code_for(snapshot.state)
}

pub async fn handle_health(args: &HealthArgs) -> i32 {
    info!("Checking build tool availability");

    let config = OrchestratorConfig::default();
    let orchestrator = match orchestrator_for(config) {
        Ok(orchestrator) => orchestrator,
        Err(code) => return code,
    };

    let results: Vec<ToolHealth> = orchestrator
        .registry()
        .all()
        .iter()
        .map(|build_system| {
            let tool = orchestrator
                .config()
                .settings
                .tool
                .clone()
                .unwrap_or_else(|| build_system.tool().to_string());
            let path = which::which(&tool).ok();
            match &path {
                Some(found) => debug!("{} found at {}", tool, found.display()),
                None => warn!("{} is not available on PATH", tool),
            }
            ToolHealth {
                build_system: build_system.id().to_string(),
                tool,
                available: path.is_some(),
                path,
            }
        })
        .collect();

    let code = print(OutputFormatter::new(args.format.into()).format_health(&results));
    if code != EXIT_SUCCESS {
        return code;
    }

    if OutputFormat::from(args.format) == OutputFormat::Human {
        println!("{}", orchestrator.config());
    }

    if results.iter().any(|health| health.available) {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(BuildState::Succeeded), 0);
        assert_eq!(exit_code_for(BuildState::Failed), 1);
        assert_eq!(exit_code_for(BuildState::Cancelled), 130);
    }

    #[test]
    fn test_apply_settings_overrides_only_given_values() {
        let mut config = OrchestratorConfig::default();
        let build_type = config.settings.build_type.clone();

        apply_settings(
            &mut config,
            &SettingsArgs {
                build_dir: Some(PathBuf::from("out")),
                build_type: None,
                jobs: Some(3),
            },
        );

        assert_eq!(config.settings.build_dir, PathBuf::from("out"));
        assert_eq!(config.settings.build_type, build_type);
        assert_eq!(config.settings.jobs, Some(3));
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        tokio::time::timeout(
            Duration::from_secs(1),
            deadline(Some(Duration::from_millis(5))),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_no_deadline_never_elapses() {
        assert!(
            tokio::time::timeout(Duration::from_millis(20), deadline(None))
                .await
                .is_err()
        );
    }
}
