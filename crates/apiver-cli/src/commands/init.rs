//! `apiver init` command implementation
//!
//! Writes a starter `api.toml` and keeps the project database out of git.

use crate::config::STATE_DIR;
use crate::error::{CliError, Result};
use crate::gitignore;
use crate::manifest::{Languages, Manifest};
use apiver_core::digest::language_extensions;
use apiver_core::Version;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Manifest file written by `init`
pub const MANIFEST_FILE: &str = "api.toml";

const DECLARATION_HINT: &str = r#"
# Declare each public function under its qualified name:
#
# [api."package.module.function"]
# arguments = ["path", "mode"]
# keywords = { verbose = "false" }
# returns = ["str"]
"#;

/// Initialize an apiver project
pub fn run(
    path: &Path,
    name: Option<String>,
    version: String,
    language: Option<String>,
    force: bool,
) -> Result<()> {
    let manifest_path = init(path, name, version, language, force)?;
    let project_dir = path.display();

    println!("✓ Initialized apiver project in {}", project_dir);
    println!("  Created: {}", manifest_path.display());
    println!("  Updated: .gitignore ({}/ ignored)", STATE_DIR);
    println!();
    println!("Declare your public functions in {}, then run:", MANIFEST_FILE);
    println!("  apiver bump {}", manifest_path.display());

    Ok(())
}

/// Write the starter manifest; returns its path
pub fn init(
    project_dir: &Path,
    name: Option<String>,
    version: String,
    language: Option<String>,
    force: bool,
) -> Result<PathBuf> {
    let manifest_path = project_dir.join(MANIFEST_FILE);

    if manifest_path.exists() && !force {
        return Err(CliError::AlreadyInitialized(format!(
            "{} already exists. Use --force to overwrite.",
            MANIFEST_FILE
        )));
    }

    Version::parse(&version)?;

    if let Some(language) = language.as_deref() {
        if language_extensions(language).is_none() {
            warn!(language = %language, "Unknown language; pass --source-types when bumping");
        }
    }

    if !project_dir.exists() {
        fs::create_dir_all(project_dir)?;
    }

    let project_name = name.unwrap_or_else(|| directory_name(project_dir));
    let mut manifest = Manifest::new(project_name, version);
    manifest.project.language = language.map(Languages::One);

    let mut content = toml::to_string(&manifest).map_err(|e| {
        CliError::invalid_manifest(format!("Failed to serialize manifest: {}", e))
    })?;
    content.push_str(DECLARATION_HINT);
    fs::write(&manifest_path, content)?;

    gitignore::update_gitignore(project_dir)?;

    Ok(manifest_path)
}

fn directory_name(dir: &Path) -> String {
    dir.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(dir)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my-project")
        .to_string()
}
