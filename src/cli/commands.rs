use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Detects a project's build system and drives cancellable builds
#[derive(Parser, Debug)]
#[command(
    name = "buildorch",
    about = "Detects a project's build system and drives cancellable builds",
    version,
    author,
    long_about = "buildorch recognizes CMake, Meson and Make projects, resolves the \
                  build tool arguments for a source file and runs the build, \
                  reporting a structured result. Ctrl-C cancels a running build."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect the build system of a path",
        long_about = "Checks whether PATH is, or directly contains, a build descriptor \
                      (CMakeLists.txt, meson.build, Makefile).\n\n\
                      Examples:\n  \
                      buildorch detect\n  \
                      buildorch detect /path/to/project --format json"
    )]
    Detect(DetectArgs),

    #[command(about = "Print the build tool arguments for a source file")]
    Flags(FlagsArgs),

    #[command(
        about = "Build a project",
        long_about = "Detects the project at PATH, resolves flags for SOURCE and runs \
                      the build tool. Exit code is 0 on success, 1 on build failure, \
                      130 when cancelled and 2 when the build could not be started.\n\n\
                      Examples:\n  \
                      buildorch build . src/main.c\n  \
                      buildorch build /proj /proj/main.c --timeout 600 --jobs 8"
    )]
    Build(BuildArgs),

    #[command(about = "Check which build tools are available on PATH")]
    Health(HealthArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "PATH", help = "Project directory or descriptor (defaults to current directory)")]
    pub path: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct FlagsArgs {
    #[arg(value_name = "PATH", help = "Project directory or descriptor")]
    pub path: PathBuf,

    #[arg(value_name = "SOURCE", help = "Source file inside the project")]
    pub source: PathBuf,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "PATH", help = "Project directory or descriptor")]
    pub path: PathBuf,

    #[arg(value_name = "SOURCE", help = "Source file inside the project")]
    pub source: PathBuf,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[arg(long, value_name = "PROGRAM", help = "Run PROGRAM instead of the build system's tool")]
    pub tool: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Cancel the build after this many seconds")]
    pub timeout: Option<u64>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

/// Overrides for the environment-provided build settings
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    #[arg(long, value_name = "DIR", help = "Build directory relative to the project root")]
    pub build_dir: Option<PathBuf>,

    #[arg(long, value_name = "TYPE", help = "Build type, e.g. Debug or Release")]
    pub build_type: Option<String>,

    #[arg(short = 'j', long, value_name = "N", help = "Parallel jobs")]
    pub jobs: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct HealthArgs {
    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
