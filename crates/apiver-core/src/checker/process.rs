//! External checker processes
//!
//! Each item is sent as JSON on stdin:
//! `{"name": ..., "descriptor": {...}, "source_dir": ...}`.
//! Exit status 0 accepts the item, 3 reports it missing, and any other
//! non-zero status reports a mismatch. Stderr carries the message.

use super::ApiChecker;
use crate::descriptor::FunctionDescriptor;
use crate::error::{ApiverError, Result};
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Exit status meaning "function not found"
pub const EXIT_MISSING: i32 = 3;

#[derive(Serialize)]
struct CheckRequest<'a> {
    name: &'a str,
    descriptor: &'a FunctionDescriptor,
    source_dir: &'a Path,
}

#[derive(Debug, Clone)]
pub struct ProcessChecker {
    program: PathBuf,
    name: String,
}

impl ProcessChecker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self { program, name }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn failure(&self, message: impl Into<String>) -> ApiverError {
        ApiverError::Checker {
            checker: self.name.clone(),
            message: message.into(),
        }
    }
}

impl ApiChecker for ProcessChecker {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_item(
        &self,
        name: &str,
        descriptor: &FunctionDescriptor,
        source_dir: &Path,
    ) -> Result<()> {
        let payload = serde_json::to_vec(&CheckRequest {
            name,
            descriptor,
            source_dir,
        })?;

        debug!(program = %self.program.display(), function = %name, "Running external checker");
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => self.failure(format!(
                    "'{}' not found",
                    self.program.display()
                )),
                _ => self.failure(e.to_string()),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A checker may exit without reading its input
            if let Err(e) = stdin.write_all(&payload) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(self.failure(e.to_string()));
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| self.failure(e.to_string()))?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = |fallback: String| if stderr.is_empty() { fallback } else { stderr.clone() };

        match output.status.code() {
            Some(0) => Ok(()),
            Some(EXIT_MISSING) => Err(ApiverError::MissingApiFunctionality(message(format!(
                "Unable to locate {}",
                name
            )))),
            Some(code) => Err(ApiverError::MismatchedApiArgument(message(format!(
                "'{}' rejected by {} (exit status {})",
                name, self.name, code
            )))),
            None => Err(self.failure("terminated by signal")),
        }
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn run(program: &Path, name: &str) -> Result<()> {
        ProcessChecker::new(program).check_item(
            name,
            &FunctionDescriptor::new().with_arguments(["x"]),
            Path::new("/src"),
        )
    }

    #[test]
    fn test_exit_codes_map_to_verdicts() {
        let dir = TempDir::new().unwrap();
        let ok = script(&dir, "ok.sh", "cat > /dev/null\nexit 0");
        let missing = script(&dir, "missing.sh", "cat > /dev/null\nexit 3");
        let mismatch = script(&dir, "mismatch.sh", "cat > /dev/null\necho 'takes 2 arguments' >&2\nexit 1");

        run(&ok, "pkg.f").unwrap();

        let err = run(&missing, "pkg.f").unwrap_err();
        assert!(matches!(err, ApiverError::MissingApiFunctionality(ref m) if m == "Unable to locate pkg.f"));

        let err = run(&mismatch, "pkg.f").unwrap_err();
        assert!(matches!(err, ApiverError::MismatchedApiArgument(ref m) if m == "takes 2 arguments"));
    }

    #[test]
    fn test_request_is_sent_on_stdin() {
        let dir = TempDir::new().unwrap();
        let capture = dir.path().join("request.json");
        let checker = script(&dir, "capture.sh", &format!("cat > '{}'", capture.display()));

        run(&checker, "pkg.f").unwrap();

        let request: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&capture).unwrap()).unwrap();
        assert_eq!(request["name"], "pkg.f");
        assert_eq!(request["descriptor"]["arguments"][0], "x");
        assert_eq!(request["source_dir"], "/src");
    }

    #[test]
    fn test_missing_program_is_checker_error() {
        let err = run(Path::new("/nonexistent/apiver-checker"), "pkg.f").unwrap_err();
        assert!(matches!(err, ApiverError::Checker { ref checker, .. } if checker == "apiver-checker"));
        assert!(!err.is_check_failure());
    }
}
