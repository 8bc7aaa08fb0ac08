//! SQLite project-record store
//!
//! One row per project: the digest and serialized API of the last persisting
//! run, plus when it was written.

use crate::error::{CliError, Result};
use apiver_core::store::{ProjectRecord, ProjectStore};
use apiver_core::ApiverError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS api_info (
    project    TEXT PRIMARY KEY,
    digest     TEXT NOT NULL,
    api        TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Project store backed by a local SQLite database
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        debug!(path = %path.display(), "Opening project database");
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::result::Result<MutexGuard<'_, Connection>, ApiverError> {
        self.db
            .lock()
            .map_err(|e| ApiverError::store(format!("Failed to acquire database lock: {}", e)))
    }

    /// When the record of `project` was last written (RFC 3339)
    pub fn updated_at(&self, project: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let updated = conn
            .query_row(
                "SELECT updated_at FROM api_info WHERE project = ?1",
                params![project],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }

    /// Every stored project name, sorted
    pub fn projects(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT project FROM api_info ORDER BY project")?;
        let projects = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(CliError::from)?;
        Ok(projects)
    }
}

fn store_error(action: &str, project: &str, err: rusqlite::Error) -> ApiverError {
    ApiverError::store(format!("Failed to {} record for '{}': {}", action, project, err))
}

impl ProjectStore for SqliteStore {
    fn get(&self, project: &str) -> apiver_core::Result<Option<ProjectRecord>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT digest, api FROM api_info WHERE project = ?1",
            params![project],
            |row| {
                Ok(ProjectRecord {
                    digest: row.get(0)?,
                    api: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|e| store_error("read", project, e))
    }

    fn insert(&self, project: &str, digest: &str, api: &str) -> apiver_core::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO api_info (project, digest, api, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![project, digest, api, Utc::now().to_rfc3339()],
        )
        .map_err(|e| store_error("insert", project, e))?;
        Ok(())
    }

    fn update(&self, project: &str, digest: &str, api: &str) -> apiver_core::Result<()> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE api_info SET digest = ?2, api = ?3, updated_at = ?4 WHERE project = ?1",
                params![project, digest, api, Utc::now().to_rfc3339()],
            )
            .map_err(|e| store_error("update", project, e))?;
        if changed == 0 {
            return Err(ApiverError::store(format!(
                "No record for '{}' to update",
                project
            )));
        }
        Ok(())
    }
}
