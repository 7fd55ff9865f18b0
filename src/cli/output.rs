//! Output formatting for the CLI
//!
//! Every command prints either a JSON document for tooling or a short
//! human-readable report.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::build::{BuildSnapshot, BuildState};
use crate::buildsystem::{BuildSystemId, Project};
use crate::flags::BuildFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

/// Availability of one build system's tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolHealth {
    pub build_system: String,
    pub tool: String,
    pub available: bool,
    pub path: Option<PathBuf>,
}

#[derive(Serialize)]
struct FlagsReport<'a> {
    build_system: &'a BuildSystemId,
    root: &'a Path,
    source: &'a Path,
    flags: &'a BuildFlags,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_project(&self, project: &Project) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(project).context("Failed to serialize project")
            }
            OutputFormat::Human => Ok(format!(
                "Build system: {}\nRoot:         {}\nDescriptor:   {}\nPriority:     {}",
                project.build_system(),
                project.root().display(),
                project.descriptor().display(),
                project.priority()
            )),
        }
    }

    pub fn format_flags(
        &self,
        project: &Project,
        source: &Path,
        flags: &BuildFlags,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&FlagsReport {
                build_system: project.build_system(),
                root: project.root(),
                source,
                flags,
            })
            .context("Failed to serialize flags"),
            OutputFormat::Human => Ok(flags.to_string()),
        }
    }

    pub fn format_snapshot(&self, snapshot: &BuildSnapshot) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(snapshot).context("Failed to serialize build result")
            }
            OutputFormat::Human => Ok(self.format_snapshot_human(snapshot)),
        }
    }

    fn format_snapshot_human(&self, snapshot: &BuildSnapshot) -> String {
        let mut output = String::new();

        let marker = match snapshot.state {
            BuildState::Succeeded => "✓",
            BuildState::Failed => "✗",
            BuildState::Cancelled => "⊘",
            BuildState::Pending | BuildState::Running => "…",
        };
        output.push_str(&format!(
            "{} Build {} {} ({}, {})\n",
            marker,
            snapshot.id,
            snapshot.state,
            snapshot.build_system,
            snapshot.root.display()
        ));

        if let (Some(started), Some(finished)) = (snapshot.started_at, snapshot.finished_at) {
            let elapsed = finished - started;
            output.push_str(&format!(
                "  Duration: {:.2}s\n",
                elapsed.num_milliseconds() as f64 / 1000.0
            ));
        }

        if !snapshot.log.is_empty() {
            output.push_str("\nLog:\n");
            for line in &snapshot.log {
                output.push_str("  ");
                output.push_str(line);
                output.push('\n');
            }
        }

        output
    }

    pub fn format_health(&self, results: &[ToolHealth]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(results).context("Failed to serialize health results")
            }
            OutputFormat::Human => {
                let mut output = String::from("Build tools:\n");
                for health in results {
                    match &health.path {
                        Some(path) => output.push_str(&format!(
                            "  ✓ {:<8} {} ({})\n",
                            health.build_system,
                            health.tool,
                            path.display()
                        )),
                        None => output.push_str(&format!(
                            "  ✗ {:<8} {} (not found on PATH)\n",
                            health.build_system, health.tool
                        )),
                    }
                }
                Ok(output)
            }
        }
    }
}
