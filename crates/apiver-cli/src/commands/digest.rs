//! `apiver digest` command implementation

use super::source_dir;
use crate::error::Result;
use crate::manifest::Manifest;
use apiver_core::digest::{compute_digest, SourceTypes};
use std::path::Path;

/// Digest of the sources and declared API, as `bump` would record it
pub fn digest(api_file: &Path, directory: Option<&Path>, source_types: Option<&str>) -> Result<String> {
    let manifest = Manifest::load(api_file)?;
    let source_types = SourceTypes::resolve(source_types, &manifest.languages())?;
    let serialized_api = manifest.api.to_canonical_json()?;

    Ok(compute_digest(
        &source_dir(api_file, directory),
        &source_types,
        &serialized_api,
        Some(api_file),
    )?)
}

pub fn run(api_file: &Path, directory: Option<&Path>, source_types: Option<&str>) -> Result<()> {
    println!("{}", digest(api_file, directory, source_types)?);
    Ok(())
}
