//! `apiver status` command implementation
//!
//! Shows what the project database holds for the manifest's project.

use crate::config::Config;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::store::SqliteStore;
use apiver_core::store::ProjectStore;
use apiver_core::ApiDescriptorSet;
use colored::Colorize;
use std::path::Path;

pub fn run(api_file: &Path, database: Option<&Path>) -> Result<()> {
    let manifest = Manifest::load(api_file)?;
    let config = Config::load()?;
    let database = config.database_for(api_file, database);
    let name = &manifest.project.name;

    println!("{}", "Project Status".cyan().bold());
    println!("  Name:     {}", name);
    println!("  Version:  {}", manifest.project.version);
    println!("  Declared: {} function(s)", manifest.api.len());
    println!("  Database: {}", database.display());
    println!();

    if !database.exists() {
        println!("No record for '{}'; run 'apiver bump' to create one", name);
        return Ok(());
    }

    let store = SqliteStore::open(&database)?;
    let Some(record) = store.get(name)? else {
        println!("No record for '{}'; run 'apiver bump' to create one", name);
        return Ok(());
    };

    let recorded = ApiDescriptorSet::from_json(&record.api)?;
    println!("{}", "Last Record".cyan().bold());
    println!("  Digest:   {}", record.digest);
    println!("  Recorded: {} function(s)", recorded.len());
    if let Some(updated_at) = store.updated_at(name)? {
        println!("  Updated:  {}", updated_at);
    }

    if recorded != manifest.api {
        println!();
        println!("{}", "Declared API differs from the last record".yellow());
    }

    Ok(())
}
