//! `apiver check` command implementation

use super::{checker_chain, source_dir};
use crate::error::Result;
use crate::manifest::Manifest;
use colored::Colorize;
use std::path::Path;

/// Verify every declared function against the sources
pub fn run(api_file: &Path, directory: Option<&Path>, checkers: Option<&str>) -> Result<()> {
    let manifest = Manifest::load(api_file)?;
    let source_dir = source_dir(api_file, directory);
    let chain = checker_chain(&manifest, checkers);

    if chain.is_empty() {
        println!(
            "{} No checker available for '{}'; nothing verified",
            "!".yellow(),
            manifest.project.name
        );
        return Ok(());
    }

    chain.check_all(&manifest.api, &source_dir)?;

    println!(
        "{} {} declared function(s) match the sources ({})",
        "✓".green(),
        manifest.api.len(),
        chain.names().join(", ")
    );

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use apiver_core::ApiverError;
    use std::fs;
    use tempfile::TempDir;

    fn project(source: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("api.yaml"),
            "project:\n  name: mathx\n  version: 0.3.0\n  language: python\napi:\n  mathx.clamp:\n    arguments: [value, low, high]\n",
        )
        .unwrap();
        fs::write(dir.path().join("mathx.py"), source).unwrap();
        dir
    }

    #[test]
    fn test_matching_sources_pass() {
        let dir = project("def clamp(value, low, high):\n    return max(low, min(value, high))\n");
        run(&dir.path().join("api.yaml"), None, None).unwrap();
    }

    #[test]
    fn test_missing_function_fails() {
        let dir = project("def clip(value):\n    return value\n");
        let err = run(&dir.path().join("api.yaml"), None, None).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(ApiverError::MissingApiFunctionality(_))
        ));
    }
}
