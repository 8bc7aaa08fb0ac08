//! apiver Core Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! The version-decision engine behind the `apiver` CLI.
//!
//! # Overview
//!
//! Given the declared API of a project and its source tree, this crate decides
//! whether (and how) the project's semantic version must advance:
//!
//! - **Version Algebra**: parse, format and increment semantic versions
//! - **Digests**: detect whether anything changed since the last recorded run
//! - **Classification**: diff two API descriptor sets into a change severity
//! - **Decisions**: sequence the above against a project-record store
//!
//! Storage, checker plugins and the command line are collaborators reached
//! through the [`store::ProjectStore`] and [`checker::ApiChecker`] traits.
//!
//! # Example
//!
//! ```no_run
//! use apiver_core::decision::{DecisionRequest, Orchestrator};
//! use apiver_core::descriptor::ApiDescriptorSet;
//! use apiver_core::digest::SourceTypes;
//! use apiver_core::store::MemoryStore;
//! use std::path::Path;
//!
//! fn bump(api: &ApiDescriptorSet) -> apiver_core::Result<()> {
//!     let store = MemoryStore::new();
//!     let source_types = SourceTypes::from_extensions(["rs"]);
//!     let request = DecisionRequest::new("demo", "1.4.2", api, Path::new("src"), &source_types);
//!     let decision = Orchestrator::new(&store).run(&request)?;
//!     println!("{}", decision.new_version);
//!     Ok(())
//! }
//! ```

pub mod checker;
pub mod classify;
pub mod decision;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod logging;
pub mod report;
pub mod store;
pub mod version;

// Re-export commonly used types
pub use classify::{ChangeReport, Severity};
pub use descriptor::{ApiDescriptorSet, FunctionDescriptor};
pub use error::{ApiverError, Result};
pub use version::Version;
