pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BuildArgs, CliArgs, Commands, DetectArgs, FlagsArgs, HealthArgs};
pub use output::{OutputFormat, OutputFormatter, ToolHealth};
