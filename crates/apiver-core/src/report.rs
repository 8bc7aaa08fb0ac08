//! Decision reports
//!
//! The ordered text lines describing a decision. Real runs write them to the
//! changelog artifact; dry runs keep them in a transient buffer.

use crate::classify::Finding;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Default changelog file name
pub const DEFAULT_CHANGELOG: &str = "apichangelog.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append one line per finding, in order
    pub fn extend_findings(&mut self, findings: &[Finding]) {
        self.lines.extend(findings.iter().map(ToString::to_string));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Last line written, which is always the decision summary
    pub fn summary(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for line in &self.lines {
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    /// Render into an in-memory buffer (dry runs)
    pub fn to_buffer(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buffer);
        buffer
    }

    /// Overwrite the changelog artifact at `path` (real runs)
    pub fn write_changelog(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        self.write_to(&mut file)?;
        file.flush()
    }
}
