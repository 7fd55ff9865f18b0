use buildorch::cli::commands::{CliArgs, Commands};
use buildorch::cli::handlers::{handle_build, handle_detect, handle_flags, handle_health};
use buildorch::util::logging::{init_logging, json_from_env, parse_level, LoggingConfig};
use buildorch::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("buildorch v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Detect(detect_args) => handle_detect(detect_args).await,
        Commands::Flags(flags_args) => handle_flags(flags_args).await,
        Commands::Build(build_args) => handle_build(build_args).await,
        Commands::Health(health_args) => handle_health(health_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("BUILDORCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    init_logging(LoggingConfig {
        use_json: json_from_env(),
        ..LoggingConfig::with_level(level)
    });
}
