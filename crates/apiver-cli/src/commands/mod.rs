//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod bump;
pub mod check;
pub mod config;
pub mod digest;
pub mod init;
pub mod status;

use crate::config::manifest_dir;
use crate::manifest::Manifest;
use apiver_core::checker::{CheckerChain, ProcessChecker};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Source directory: the explicit one, else the manifest's directory
pub(crate) fn source_dir(manifest_path: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir(manifest_path))
}

/// Checkers for a manifest: external executables when given, otherwise the
/// built-ins for the declared languages
pub(crate) fn checker_chain(manifest: &Manifest, external: Option<&str>) -> CheckerChain {
    let external: Vec<&str> = external
        .map(|list| list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if !external.is_empty() {
        return external
            .into_iter()
            .fold(CheckerChain::new(), |chain, program| {
                chain.with(Box::new(ProcessChecker::new(program)))
            });
    }

    let languages = manifest.languages();
    if languages.is_empty() {
        warn!(project = %manifest.project.name, "No language declared; skipping invariant checks");
        return CheckerChain::new();
    }

    let (chain, unsupported) = CheckerChain::for_languages(&languages);
    for language in unsupported {
        warn!(language = %language, "No built-in checker for language");
    }
    chain
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::manifest::Languages;

    #[test]
    fn test_source_dir_defaults_to_manifest_dir() {
        assert_eq!(
            source_dir(Path::new("proj/api.toml"), None),
            PathBuf::from("proj")
        );
        assert_eq!(
            source_dir(Path::new("proj/api.toml"), Some(Path::new("src"))),
            PathBuf::from("src")
        );
    }

    #[test]
    fn test_checker_selection() {
        let mut manifest = Manifest::new("demo", "1.0.0");
        assert!(checker_chain(&manifest, None).is_empty());

        manifest.project.language = Some(Languages::Many(vec![
            "python".to_string(),
            "c".to_string(),
        ]));
        assert_eq!(checker_chain(&manifest, None).names(), vec!["python"]);

        let chain = checker_chain(&manifest, Some("./tools/check-a, /opt/check-b,"));
        assert_eq!(chain.names(), vec!["check-a", "check-b"]);
    }
}
