//! `apiver bump` command implementation
//!
//! Runs the checker pass, decides the next version against the project
//! database, then records the result: database row, changelog, and the
//! manifest's version entry.

use super::{checker_chain, source_dir};
use crate::config::Config;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::store::SqliteStore;
use crate::BumpArgs;
use apiver_core::decision::{Decision, DecisionRequest, Orchestrator};
use apiver_core::digest::SourceTypes;
use apiver_core::store::ProjectStore;
use colored::Colorize;
use std::fs;
use tracing::{debug, info};

/// Banner printed before a dry-run report
pub const DRY_RUN_BANNER: &str =
    "Performing a dry run; Changes will not be written to DB or API file";

/// Decide and print the next version
pub fn run(args: &BumpArgs) -> Result<()> {
    let config = Config::load()?;
    let decision = execute(args, &config)?;

    if args.silent {
        return Ok(());
    }

    if decision.dry_run {
        println!("{}", DRY_RUN_BANNER.yellow());
        print!("{}", String::from_utf8_lossy(&decision.report.to_buffer()));
    } else {
        for line in decision.report.lines() {
            println!("{}", line);
        }
    }

    Ok(())
}

/// Decide the next version and, unless dry-running, record it
pub fn execute(args: &BumpArgs, config: &Config) -> Result<Decision> {
    let database = config.database_for(&args.api_file, args.database.as_deref());
    let store = if args.dry_run && !database.exists() {
        SqliteStore::open_in_memory()?
    } else {
        SqliteStore::open(&database)?
    };
    execute_with_store(args, config, &store)
}

/// [`execute`] against an already opened store.
///
/// The manifest rewrite is rendered first, the store record is written next,
/// and only then do the manifest and changelog files change.
pub fn execute_with_store(
    args: &BumpArgs,
    config: &Config,
    store: &dyn ProjectStore,
) -> Result<Decision> {
    let manifest = Manifest::load(&args.api_file)?;
    let source_dir = source_dir(&args.api_file, args.directory.as_deref());

    if args.no_invariant_check {
        debug!("Invariant checks skipped");
    } else {
        let chain = checker_chain(&manifest, args.checkers.as_deref());
        chain.check_all(&manifest.api, &source_dir)?;
    }

    let source_types =
        SourceTypes::resolve(args.source_types.as_deref(), &manifest.languages())?;

    let request = DecisionRequest::new(
        &manifest.project.name,
        &manifest.project.version,
        &manifest.api,
        &source_dir,
        &source_types,
    )
    .with_descriptor(&args.api_file)
    .with_explicit_version(args.explicit_version.as_deref())
    .with_prerelease(args.prerelease.as_deref())
    .with_build(args.build_metadata.as_deref())
    .dry_run(args.dry_run);

    let orchestrator = Orchestrator::new(store);
    let decision = orchestrator.decide(&request)?;

    if decision.dry_run {
        return Ok(decision);
    }

    let rewritten = if decision.version_changed() {
        Some(Manifest::render_version(
            &args.api_file,
            &decision.previous_version,
            &decision.new_version,
        )?)
    } else {
        None
    };

    if let Some(instruction) = &decision.persist {
        orchestrator.persist(instruction)?;
    }

    if let Some(content) = rewritten {
        fs::write(&args.api_file, content)?;
        info!(
            manifest = %args.api_file.display(),
            version = %decision.new_version,
            "Updated manifest version"
        );
    }

    let changelog = config.changelog();
    decision.report.write_changelog(&changelog)?;
    debug!(path = %changelog.display(), "Wrote changelog");

    Ok(decision)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use apiver_core::decision::Outcome;
    use apiver_core::store::ProjectRecord;
    use apiver_core::{ApiverError, Severity};
    use crate::error::CliError;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const MANIFEST: &str = r#"[project]
name = "libvh"
version = "1.4.2"
language = "python"

[api."libvh.parse_version"]
arguments = ["version"]
"#;

    struct Project {
        dir: TempDir,
        config: Config,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("api.toml"), MANIFEST).unwrap();
            fs::write(
                dir.path().join("libvh.py"),
                "def parse_version(version):\n    return version\n",
            )
            .unwrap();
            let config = Config {
                database: None,
                changelog: Some(dir.path().join("apichangelog.txt")),
            };
            Self { dir, config }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn args(&self) -> BumpArgs {
            BumpArgs {
                api_file: self.path("api.toml"),
                ..BumpArgs::default()
            }
        }

        fn version(&self) -> String {
            Manifest::load(self.path("api.toml")).unwrap().project.version
        }

        fn add_function(&self) {
            let mut text = fs::read_to_string(self.path("api.toml")).unwrap();
            text.push_str("\n[api.\"libvh.render\"]\narguments = [\"version\"]\n");
            fs::write(self.path("api.toml"), text).unwrap();
            fs::write(
                self.path("libvh.py"),
                "def parse_version(version):\n    return version\n\ndef render(version):\n    pass\n",
            )
            .unwrap();
        }
    }

    #[test]
    fn test_first_run_then_no_change() {
        let project = Project::new();

        let decision = execute(&project.args(), &project.config).unwrap();
        assert_eq!(decision.outcome, Outcome::FirstRun);
        assert!(project.path(".apiver/api.db").exists());
        assert_eq!(
            fs::read_to_string(project.path("apichangelog.txt")).unwrap(),
            "First run, version is set to 1.4.2\n"
        );

        let decision = execute(&project.args(), &project.config).unwrap();
        assert_eq!(decision.outcome, Outcome::Unchanged);
        assert_eq!(project.version(), "1.4.2");
    }

    #[test]
    fn test_added_function_bumps_minor_and_rewrites_manifest() {
        let project = Project::new();
        execute(&project.args(), &project.config).unwrap();

        project.add_function();
        let decision = execute(&project.args(), &project.config).unwrap();

        assert_eq!(decision.outcome, Outcome::Bumped(Severity::Minor));
        assert_eq!(project.version(), "1.5.0");

        let changelog = fs::read_to_string(project.path("apichangelog.txt")).unwrap();
        assert!(changelog.contains("Change type: minor"));
        assert!(changelog.ends_with("Changed version from 1.4.2 to 1.5.0\n"));

        // The rewritten manifest is the new baseline
        let decision = execute(&project.args(), &project.config).unwrap();
        assert_eq!(decision.outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let project = Project::new();
        let args = BumpArgs {
            dry_run: true,
            ..project.args()
        };

        let decision = execute(&args, &project.config).unwrap();
        assert!(decision.dry_run);
        assert!(!project.path(".apiver/api.db").exists());
        assert!(!project.path("apichangelog.txt").exists());

        execute(&project.args(), &project.config).unwrap();
        project.add_function();
        let decision = execute(&args, &project.config).unwrap();
        assert_eq!(decision.new_version, "1.5.0");
        assert_eq!(project.version(), "1.4.2");

        let store = SqliteStore::open(project.path(".apiver/api.db")).unwrap();
        let record = store.get("libvh").unwrap().unwrap();
        assert!(!record.api.contains("libvh.render"));
    }

    #[test]
    fn test_explicit_version_and_metadata() {
        let project = Project::new();
        let args = BumpArgs {
            explicit_version: Some("2.0.0".to_string()),
            build_metadata: Some("exp.1".to_string()),
            ..project.args()
        };

        let decision = execute(&args, &project.config).unwrap();
        assert_eq!(decision.new_version, "2.0.0+exp.1");
        assert_eq!(project.version(), "2.0.0+exp.1");
    }

    #[test]
    fn test_checker_failure_aborts_before_writing() {
        let project = Project::new();
        fs::write(project.path("libvh.py"), "def parse_version(version, strict):\n    pass\n")
            .unwrap();

        let err = execute(&project.args(), &project.config).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(ApiverError::MismatchedApiArgument(_))
        ));
        assert!(!project.path(".apiver/api.db").exists());

        let args = BumpArgs {
            no_invariant_check: true,
            ..project.args()
        };
        execute(&args, &project.config).unwrap();
    }

    /// Reads like an empty database but refuses every write
    struct ReadOnlyStore;

    impl ProjectStore for ReadOnlyStore {
        fn get(&self, _project: &str) -> apiver_core::Result<Option<ProjectRecord>> {
            Ok(None)
        }

        fn insert(&self, _project: &str, _digest: &str, _api: &str) -> apiver_core::Result<()> {
            Err(ApiverError::store("attempt to write a readonly database"))
        }

        fn update(&self, _project: &str, _digest: &str, _api: &str) -> apiver_core::Result<()> {
            Err(ApiverError::store("attempt to write a readonly database"))
        }
    }

    #[test]
    fn test_store_failure_leaves_manifest_and_changelog_untouched() {
        let project = Project::new();
        let args = BumpArgs {
            explicit_version: Some("2.0.0".to_string()),
            ..project.args()
        };

        let err = execute_with_store(&args, &project.config, &ReadOnlyStore).unwrap_err();
        assert!(matches!(err, CliError::Core(ApiverError::Store(_))));
        assert_eq!(
            fs::read_to_string(project.path("api.toml")).unwrap(),
            MANIFEST
        );
        assert!(!project.path("apichangelog.txt").exists());
    }

    #[test]
    fn test_unwritable_version_entry_fails_before_persisting() {
        let project = Project::new();
        // Minified JSON has no line of its own holding the version
        fs::write(
            project.path("api.json"),
            r#"{"project": {"name": "libvh", "version": "1.4.2", "language": "python"}, "api": {"libvh.parse_version": {"arguments": ["version"]}}}"#,
        )
        .unwrap();
        let args = BumpArgs {
            api_file: project.path("api.json"),
            explicit_version: Some("2.0.0".to_string()),
            ..BumpArgs::default()
        };
        let store = apiver_core::store::MemoryStore::new();

        let err = execute_with_store(&args, &project.config, &store).unwrap_err();
        assert!(matches!(err, CliError::InvalidManifest(_)));
        assert!(store.is_empty());
        assert!(!project.path("apichangelog.txt").exists());
    }

    #[test]
    fn test_invalid_prerelease_is_rejected() {
        let project = Project::new();
        let args = BumpArgs {
            prerelease: Some("01.2".to_string()),
            ..project.args()
        };

        let err = execute(&args, &project.config).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(ApiverError::InvalidPrerelease { .. })
        ));
        assert!(!project.path("apichangelog.txt").exists());
        assert!(Path::new(&project.path("api.toml")).exists());
    }
}
