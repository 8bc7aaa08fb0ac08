//! apiver CLI - Main entry point

use apiver_cli::{Cli, Commands, ConfigCommand};
use apiver_core::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("apiver")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring invalid APIVER_LOG_* setting: {}", e);
        LogConfig::builder().level(level).build()
    });

    // Keep the guard so file output is flushed
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };

    if let Err(e) = execute_command(&cli) {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn execute_command(cli: &Cli) -> apiver_cli::Result<()> {
    match &cli.command {
        Commands::Bump(args) => apiver_cli::commands::bump::run(args),
        Commands::Check {
            api_file,
            directory,
            checkers,
        } => apiver_cli::commands::check::run(api_file, directory.as_deref(), checkers.as_deref()),
        Commands::Digest {
            api_file,
            directory,
            source_types,
        } => apiver_cli::commands::digest::run(
            api_file,
            directory.as_deref(),
            source_types.as_deref(),
        ),
        Commands::Status { api_file, database } => {
            apiver_cli::commands::status::run(api_file, database.as_deref())
        },
        Commands::Init {
            path,
            name,
            version,
            language,
            force,
        } => apiver_cli::commands::init::run(
            path,
            name.clone(),
            version.clone(),
            language.clone(),
            *force,
        ),
        Commands::Config { command } => match command {
            ConfigCommand::Get { key } => apiver_cli::commands::config::get(key),
            ConfigCommand::Show => apiver_cli::commands::config::show(),
        },
    }
}
