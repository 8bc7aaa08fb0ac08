//! Source-tree digests
//!
//! A digest summarizes every tracked source file plus the serialized API so a
//! run can cheaply tell that nothing changed since the last recorded state.
//! Uses SHA-256; file paths are sorted before hashing so the result does not
//! depend on directory iteration order.

use crate::error::{ApiverError, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Marker fed after the serialized API
pub const DESCRIPTOR_MARKER: &[u8] = b"api";

/// Built-in language -> source extension table
const LANGUAGE_EXTENSIONS: &[(&str, &[&str])] = &[
    ("python", &["py"]),
    ("c", &["c"]),
    ("rust", &["rs"]),
];

/// Extensions of the files that count as source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTypes {
    extensions: BTreeSet<String>,
}

impl SourceTypes {
    /// Build from extensions; a leading `.` is accepted and blanks are ignored
    pub fn from_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    /// Parse a comma-separated list such as `"py, pyx"`
    pub fn parse_list(list: &str) -> Self {
        Self::from_extensions(list.split(','))
    }

    /// Infer extensions from the declared languages
    pub fn for_languages<S: AsRef<str>>(languages: &[S]) -> Result<Self> {
        if languages.is_empty() {
            return Err(ApiverError::UnspecifiedSourceTypes(
                "; no language declared".to_string(),
            ));
        }

        let mut extensions = BTreeSet::new();
        for language in languages {
            let language = language.as_ref();
            let known = language_extensions(language).ok_or_else(|| {
                ApiverError::UnspecifiedSourceTypes(format!(" for language '{}'", language))
            })?;
            extensions.extend(known.iter().map(|ext| ext.to_string()));
        }
        Ok(Self { extensions })
    }

    /// Explicit extensions win; otherwise fall back to the languages
    pub fn resolve<S: AsRef<str>>(explicit: Option<&str>, languages: &[S]) -> Result<Self> {
        match explicit.map(Self::parse_list) {
            Some(types) if !types.is_empty() => Ok(types),
            _ => Self::for_languages(languages),
        }
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

/// Source extensions known for `language` (case-insensitive)
pub fn language_extensions(language: &str) -> Option<&'static [&'static str]> {
    let language = language.to_lowercase();
    LANGUAGE_EXTENSIONS
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, extensions)| *extensions)
}

/// Compute the digest of `root` for the given source types and serialized API.
///
/// The descriptor file at `descriptor` (if any) is skipped so it only
/// contributes through `serialized_api`.
pub fn compute_digest(
    root: &Path,
    source_types: &SourceTypes,
    serialized_api: &str,
    descriptor: Option<&Path>,
) -> Result<String> {
    let files = collect_source_files(root, source_types, descriptor)?;
    debug!(root = %root.display(), files = files.len(), "Computing source digest");
    digest_paths(files, serialized_api)
}

/// Every tracked source file under `root`, sorted.
///
/// Symlinked files count with their target's contents; symlinked
/// directories are not descended into.
pub fn collect_source_files(
    root: &Path,
    source_types: &SourceTypes,
    descriptor: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let descriptor = descriptor.map(|path| (path.file_name(), canonical(path)));
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if !source_types.contains(extension) {
            continue;
        }
        if let Some((name, descriptor_path)) = &descriptor {
            if path.file_name() == *name && canonical(path) == *descriptor_path {
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Hash the given files (in sorted order) followed by the serialized API
pub fn digest_paths<I>(paths: I, serialized_api: &str) -> Result<String>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut paths: Vec<PathBuf> = paths.into_iter().collect();
    paths.sort();

    let mut hasher = Sha256::new();
    for path in &paths {
        trace!(path = %path.display(), "Hashing source file");
        let mut file = std::fs::File::open(path)?;
        hash_reader(&mut hasher, &mut file)?;
    }
    hasher.update(serialized_api.as_bytes());
    hasher.update(DESCRIPTOR_MARKER);

    Ok(hex::encode(hasher.finalize()))
}

fn hash_reader<R: Read>(hasher: &mut Sha256, reader: &mut R) -> Result<()> {
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(())
}
