//! API manifest handling (api.toml / api.yaml / api.json)
//!
//! The manifest carries the project metadata and the declared API descriptor
//! set. Its version entry is rewritten in place after a bump.

use crate::error::{CliError, Result};
use apiver_core::{ApiDescriptorSet, Version};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// API manifest file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Project metadata
    pub project: ProjectMetadata,

    /// Declared functions, keyed by qualified name
    #[serde(default)]
    pub api: ApiDescriptorSet,
}

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMetadata {
    pub name: String,

    /// Currently declared version
    pub version: String,

    /// Source language(s), used to infer source types and checkers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Languages>,
}

/// `language = "python"` or `language = ["python", "c"]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Languages {
    One(String),
    Many(Vec<String>),
}

/// On-disk format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Yaml,
    Json,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("toml") => Ok(Self::Toml),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(CliError::invalid_manifest(format!(
                "'{}' must end in .toml, .yaml, .yml or .json",
                path.display()
            ))),
        }
    }
}

impl Manifest {
    /// Create a manifest with no declared functions
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            project: ProjectMetadata {
                name: name.into(),
                version: version.into(),
                language: None,
            },
            api: ApiDescriptorSet::new(),
        }
    }

    /// Load and validate a manifest
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }

        let format = ManifestFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let manifest = Self::parse(&content, format)?;
        manifest.validate()?;

        Ok(manifest)
    }

    pub fn parse(content: &str, format: ManifestFormat) -> Result<Self> {
        let manifest = match format {
            ManifestFormat::Toml => toml::from_str(content)?,
            ManifestFormat::Yaml => serde_yaml::from_str(content)?,
            ManifestFormat::Json => serde_json::from_str(content)?,
        };
        Ok(manifest)
    }

    /// Validate the manifest structure
    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(CliError::invalid_manifest("Project name cannot be empty"));
        }

        if self.project.version.trim().is_empty() {
            return Err(CliError::invalid_manifest("Project version cannot be empty"));
        }

        Version::parse(&self.project.version)?;

        Ok(())
    }

    /// Declared languages, in order
    pub fn languages(&self) -> Vec<String> {
        match &self.project.language {
            None => Vec::new(),
            Some(Languages::One(language)) => vec![language.clone()],
            Some(Languages::Many(languages)) => languages.clone(),
        }
    }

    /// Content of the manifest at `path` with its declared version replaced.
    ///
    /// Only the first `version` entry holding `old` (quoted or bare) changes;
    /// every other byte of the file is preserved. Nothing is written.
    pub fn render_version(path: impl AsRef<Path>, old: &str, new: &str) -> Result<String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        replace_version(&content, old, new).ok_or_else(|| {
            CliError::invalid_manifest(format!(
                "No version entry with value '{}' found in '{}'",
                old,
                path.display()
            ))
        })
    }

    /// Rewrite the declared version in the manifest at `path`
    pub fn write_version(path: impl AsRef<Path>, old: &str, new: &str) -> Result<()> {
        let path = path.as_ref();
        let updated = Self::render_version(path, old, new)?;
        std::fs::write(path, updated)?;
        Ok(())
    }
}

fn replace_version(content: &str, old: &str, new: &str) -> Option<String> {
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        if let Some(value_start) = version_value_start(line) {
            let value = &line[value_start..];
            for quote in ['"', '\''] {
                let quoted = format!("{quote}{old}{quote}");
                if value.trim_start().starts_with(&quoted) {
                    let start = offset + value_start + value.len() - value.trim_start().len();
                    let mut updated = String::with_capacity(content.len() + new.len());
                    updated.push_str(&content[..start]);
                    updated.push_str(&format!("{quote}{new}{quote}"));
                    updated.push_str(&content[start + quoted.len()..]);
                    return Some(updated);
                }
            }
            if let Some(start) = bare_value_start(value, old) {
                let start = offset + value_start + start;
                return Some(format!(
                    "{}{}{}",
                    &content[..start],
                    new,
                    &content[start + old.len()..]
                ));
            }
        }
        offset += line.len();
    }

    None
}

/// Byte offset just past the separator when the line's key is exactly `version`
fn version_value_start(line: &str) -> Option<usize> {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    let (quote, rest) = match rest.chars().next() {
        Some(q @ ('"' | '\'')) => (Some(q), &rest[1..]),
        _ => (None, rest),
    };
    let rest = rest.strip_prefix("version")?;
    let rest = match quote {
        Some(q) => rest.strip_prefix(q)?,
        None => rest,
    };
    let after_key = rest.trim_start();
    let after_separator = after_key.strip_prefix(['=', ':'])?;
    Some(line.len() - after_separator.len())
}

/// Position of an unquoted `old` at the start of `value` (`version: 1.2.3`)
fn bare_value_start(value: &str, old: &str) -> Option<usize> {
    let trimmed = value.trim_start();
    let tail = trimmed.strip_prefix(old)?;
    let ends_token = tail
        .chars()
        .next()
        .map_or(true, |c| c.is_whitespace() || c == '#' || c == ',');
    ends_token.then(|| value.len() - trimmed.len())
}
