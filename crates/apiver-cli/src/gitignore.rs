//! .gitignore management for apiver projects
//!
//! Keeps the project database directory out of version control.

use crate::config::STATE_DIR;
use crate::error::Result;
use std::fs;
use std::path::Path;

/// Marker comment for the apiver section in .gitignore
const SECTION_MARKER: &str = "# apiver project records";

/// Whether `.gitignore` content already ignores the state directory
fn ignores_state_dir(content: &str) -> bool {
    content.lines().map(str::trim).any(|line| {
        line.trim_start_matches('/')
            .trim_end_matches('/')
            .eq(STATE_DIR)
    })
}

/// Add the apiver section to `<project_dir>/.gitignore`.
///
/// Idempotent: creates the file when missing, appends the section once, and
/// leaves files that already ignore the state directory untouched. Returns
/// whether the file was changed.
pub fn update_gitignore(project_dir: &Path) -> Result<bool> {
    let path = project_dir.join(".gitignore");
    let mut content = if path.exists() {
        fs::read_to_string(&path)?
    } else {
        String::new()
    };

    if ignores_state_dir(&content) {
        return Ok(false);
    }

    if !content.is_empty() {
        if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push('\n');
    }
    content.push_str(SECTION_MARKER);
    content.push('\n');
    content.push_str(STATE_DIR);
    content.push_str("/\n");

    fs::write(&path, content)?;
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gitignore_new_file() {
        let temp = TempDir::new().unwrap();
        assert!(update_gitignore(temp.path()).unwrap());

        let content = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
        assert_eq!(content, "# apiver project records\n.apiver/\n");
    }

    #[test]
    fn test_gitignore_append() {
        let temp = TempDir::new().unwrap();
        let gitignore = temp.path().join(".gitignore");
        fs::write(&gitignore, "target/\n*.log").unwrap();

        update_gitignore(temp.path()).unwrap();

        let content = fs::read_to_string(&gitignore).unwrap();
        assert_eq!(content, "target/\n*.log\n\n# apiver project records\n.apiver/\n");
    }

    #[test]
    fn test_gitignore_idempotent() {
        let temp = TempDir::new().unwrap();
        let gitignore = temp.path().join(".gitignore");

        update_gitignore(temp.path()).unwrap();
        let first = fs::read_to_string(&gitignore).unwrap();
        assert!(!update_gitignore(temp.path()).unwrap());
        assert_eq!(first, fs::read_to_string(&gitignore).unwrap());
    }

    #[test]
    fn test_existing_entry_is_respected() {
        let temp = TempDir::new().unwrap();
        let gitignore = temp.path().join(".gitignore");
        fs::write(&gitignore, "/.apiver\n").unwrap();

        assert!(!update_gitignore(temp.path()).unwrap());
        assert_eq!(fs::read_to_string(&gitignore).unwrap(), "/.apiver\n");
    }
}
