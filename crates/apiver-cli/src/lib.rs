//! apiver CLI Library
//!
//! Command-line front end for the apiver version-decision engine.
//!
//! # Overview
//!
//! - **Version Bumps**: decide and record the next version (`apiver bump`)
//! - **Invariant Checks**: verify declared functions against sources (`apiver check`)
//! - **Digests**: print the current source digest (`apiver digest`)
//! - **Status**: show the stored record for a project (`apiver status`)
//! - **Project Setup**: write a starter API manifest (`apiver init`)
//! - **Configuration**: inspect effective settings (`apiver config`)

pub mod commands;
pub mod config;
pub mod error;
pub mod gitignore;
pub mod manifest;
pub mod store;

// Re-export commonly used types
pub use error::{CliError, Result};
pub use manifest::Manifest;
pub use store::SqliteStore;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// apiver - semantic versions decided from your declared API
#[derive(Parser, Debug)]
#[command(name = "apiver")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide the next version and record it
    Bump(BumpArgs),

    /// Check declared functions against the sources
    Check {
        /// API manifest (api.toml, api.yaml or api.json)
        api_file: PathBuf,

        /// Source directory (defaults to the manifest's directory)
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Comma-separated external checker executables
        #[arg(short, long)]
        checkers: Option<String>,
    },

    /// Print the digest of the current sources and API
    Digest {
        /// API manifest
        api_file: PathBuf,

        /// Source directory (defaults to the manifest's directory)
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Comma-separated source file extensions (e.g. "py,pyx")
        #[arg(short = 'x', long)]
        source_types: Option<String>,
    },

    /// Show the stored record for the manifest's project
    Status {
        /// API manifest
        api_file: PathBuf,

        /// Project database (defaults to .apiver/api.db next to the manifest)
        #[arg(long, env = "APIVER_DATABASE")]
        database: Option<PathBuf>,
    },

    /// Write a starter API manifest
    Init {
        /// Project directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Project name (defaults to directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Initial version
        #[arg(short = 'V', long, default_value = "0.1.0")]
        version: String,

        /// Source language (python, rust, c)
        #[arg(short, long)]
        language: Option<String>,

        /// Overwrite an existing api.toml
        #[arg(short, long)]
        force: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Options of `apiver bump`
#[derive(Args, Debug, Clone, Default)]
pub struct BumpArgs {
    /// API manifest (api.toml, api.yaml or api.json)
    pub api_file: PathBuf,

    /// Set the version explicitly instead of deciding it
    #[arg(long = "set-version", value_name = "VERSION")]
    pub explicit_version: Option<String>,

    /// Source directory (defaults to the manifest's directory)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Prerelease label to attach (e.g. "rc.1")
    #[arg(short, long)]
    pub prerelease: Option<String>,

    /// Build metadata to attach (e.g. "exp.sha.5114f85")
    #[arg(short, long)]
    pub build_metadata: Option<String>,

    /// Project database (defaults to .apiver/api.db next to the manifest)
    #[arg(long, env = "APIVER_DATABASE")]
    pub database: Option<PathBuf>,

    /// Comma-separated external checker executables
    #[arg(short, long)]
    pub checkers: Option<String>,

    /// Comma-separated source file extensions (e.g. "py,pyx")
    #[arg(short = 'x', long)]
    pub source_types: Option<String>,

    /// Skip verifying declared functions against the sources
    #[arg(long)]
    pub no_invariant_check: bool,

    /// Decide without writing the database, changelog or manifest
    #[arg(long)]
    pub dry_run: bool,

    /// Print nothing
    #[arg(short, long)]
    pub silent: bool,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Get configuration value
    Get {
        /// Configuration key (database, changelog)
        key: String,
    },

    /// Show all configuration
    Show,
}
