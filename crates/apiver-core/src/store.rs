//! Project-record store contract
//!
//! The orchestrator never owns persistence: it reads the previous record and
//! hands back what should be written through this trait.

use crate::error::{ApiverError, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Last recorded state of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    /// Digest of the source tree + API at the last persisting run
    pub digest: String,
    /// Serialized API descriptor set at the last persisting run
    pub api: String,
}

/// Keyed record store (dependency injection)
pub trait ProjectStore {
    /// Fetch the record for `project`, if any
    fn get(&self, project: &str) -> Result<Option<ProjectRecord>>;

    /// Create the record for a project seen for the first time
    fn insert(&self, project: &str, digest: &str, api: &str) -> Result<()>;

    /// Replace the record of a known project
    fn update(&self, project: &str, digest: &str, api: &str) -> Result<()>;
}

/// In-memory store, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, ProjectRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored projects
    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_records<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, ProjectRecord>) -> Result<T>,
    ) -> Result<T> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| ApiverError::store(format!("Failed to acquire store lock: {}", e)))?;
        f(&mut records)
    }
}

impl ProjectStore for MemoryStore {
    fn get(&self, project: &str) -> Result<Option<ProjectRecord>> {
        self.with_records(|records| Ok(records.get(project).cloned()))
    }

    fn insert(&self, project: &str, digest: &str, api: &str) -> Result<()> {
        self.with_records(|records| {
            if records.contains_key(project) {
                return Err(ApiverError::store(format!(
                    "Project '{}' already has a record",
                    project
                )));
            }
            records.insert(
                project.to_string(),
                ProjectRecord {
                    digest: digest.to_string(),
                    api: api.to_string(),
                },
            );
            Ok(())
        })
    }

    fn update(&self, project: &str, digest: &str, api: &str) -> Result<()> {
        self.with_records(|records| {
            let record = records.get_mut(project).ok_or_else(|| {
                ApiverError::store(format!("Project '{}' has no record to update", project))
            })?;
            record.digest = digest.to_string();
            record.api = api.to_string();
            Ok(())
        })
    }
}
