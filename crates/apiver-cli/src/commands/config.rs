//! `apiver config` command implementation

use crate::config::{Config, CONFIG_KEYS};
use crate::error::Result;
use colored::Colorize;

/// Print one effective configuration value
pub fn get(key: &str) -> Result<()> {
    let config = Config::load()?;
    println!("{}", config.get(key)?);
    Ok(())
}

/// Print the effective configuration
pub fn show() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "Configuration".cyan().bold());
    match Config::config_file_path() {
        Some(path) if path.exists() => println!("  File:      {}", path.display()),
        Some(path) => println!("  File:      {} (not present)", path.display()),
        None => println!("  File:      <none>"),
    }
    for key in CONFIG_KEYS {
        println!("  {:<10} {}", format!("{}:", key), config.get(key)?);
    }

    Ok(())
}
