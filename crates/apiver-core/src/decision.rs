//! Version decisions
//!
//! The [`Orchestrator`] sequences digesting, the store lookup, classification
//! and the version algebra into a single [`Decision`]. A decision is computed
//! in full before anything is written; [`Orchestrator::run`] then applies its
//! persistence instruction, if any.

use crate::classify::{classify, ChangeReport, Severity};
use crate::descriptor::ApiDescriptorSet;
use crate::digest::{compute_digest, SourceTypes};
use crate::error::Result;
use crate::report::Report;
use crate::store::ProjectStore;
use crate::version::{attach_metadata, Version};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Inputs of one decision run
#[derive(Debug, Clone)]
pub struct DecisionRequest<'a> {
    pub project: &'a str,
    /// Version currently declared by the project
    pub declared_version: &'a str,
    pub api: &'a ApiDescriptorSet,
    pub source_dir: &'a Path,
    pub source_types: &'a SourceTypes,
    /// Descriptor file, excluded from the digest
    pub descriptor: Option<&'a Path>,
    pub explicit_version: Option<&'a str>,
    pub prerelease: Option<&'a str>,
    pub build: Option<&'a str>,
    pub dry_run: bool,
}

impl<'a> DecisionRequest<'a> {
    pub fn new(
        project: &'a str,
        declared_version: &'a str,
        api: &'a ApiDescriptorSet,
        source_dir: &'a Path,
        source_types: &'a SourceTypes,
    ) -> Self {
        Self {
            project,
            declared_version,
            api,
            source_dir,
            source_types,
            descriptor: None,
            explicit_version: None,
            prerelease: None,
            build: None,
            dry_run: false,
        }
    }

    pub fn with_descriptor(mut self, path: &'a Path) -> Self {
        self.descriptor = Some(path);
        self
    }

    pub fn with_explicit_version(mut self, version: Option<&'a str>) -> Self {
        self.explicit_version = version;
        self
    }

    pub fn with_prerelease(mut self, prerelease: Option<&'a str>) -> Self {
        self.prerelease = prerelease;
        self
    }

    pub fn with_build(mut self, build: Option<&'a str>) -> Self {
        self.build = build;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn supplied_metadata(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if self.prerelease.is_some_and(|pre| !pre.is_empty()) {
            kinds.push("prerelease");
        }
        if self.build.is_some_and(|build| !build.is_empty()) {
            kinds.push("build_metadata");
        }
        kinds
    }
}

/// Which branch of the decision was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "severity", rename_all = "snake_case")]
pub enum Outcome {
    /// An explicit version was requested
    Explicit,
    /// No previous record; the current state becomes the baseline
    FirstRun,
    /// Nothing changed since the last record
    Unchanged,
    /// Nothing changed, but prerelease/build metadata was supplied
    MetadataOnly,
    /// The API or sources changed and the version was advanced
    Bumped(Severity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    Insert,
    Update,
}

/// What the store should record once the decision is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistInstruction {
    pub project: String,
    pub digest: String,
    /// Canonical JSON of the current descriptor set
    pub api: String,
    pub mode: Persistence,
}

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub previous_version: String,
    pub new_version: String,
    pub digest: String,
    /// Classifier verdict, only when a comparison was made
    pub changes: Option<ChangeReport>,
    #[serde(skip)]
    pub report: Report,
    /// `None` for no-op and dry-run decisions
    pub persist: Option<PersistInstruction>,
    pub dry_run: bool,
}

impl Decision {
    pub fn version_changed(&self) -> bool {
        self.previous_version != self.new_version
    }
}

/// Decides versions against an injected project store
pub struct Orchestrator<'s> {
    store: &'s dyn ProjectStore,
}

impl<'s> Orchestrator<'s> {
    pub fn new(store: &'s dyn ProjectStore) -> Self {
        Self { store }
    }

    /// Compute the decision for `request` without writing anything
    #[instrument(skip_all, fields(project = %request.project, dry_run = request.dry_run))]
    pub fn decide(&self, request: &DecisionRequest<'_>) -> Result<Decision> {
        let api = request.api.to_canonical_json()?;
        let digest = compute_digest(
            request.source_dir,
            request.source_types,
            &api,
            request.descriptor,
        )?;
        let previous = self.store.get(request.project)?;
        debug!(digest = %digest, has_record = previous.is_some(), "Loaded project state");

        let declared = request.declared_version;
        let mut report = Report::new();
        let mut changes = None;

        let (outcome, new_version) = if let Some(explicit) = request.explicit_version {
            let new = attach_metadata(explicit, request.prerelease, request.build)?.to_string();
            report.push(format!("Set version to {} (from {})", new, declared));
            (Outcome::Explicit, new)
        } else {
            match &previous {
                None => {
                    let new = attach_metadata(declared, request.prerelease, request.build)?
                        .to_string();
                    report.push(format!("First run, version is set to {}", new));
                    (Outcome::FirstRun, new)
                },
                Some(record) if record.digest == digest => {
                    let supplied = request.supplied_metadata();
                    if supplied.is_empty() {
                        report.push(format!("No changes. Version number: {}", declared));
                        info!(version = %declared, "No changes detected");
                        return Ok(Decision {
                            outcome: Outcome::Unchanged,
                            previous_version: declared.to_string(),
                            new_version: declared.to_string(),
                            digest,
                            changes: None,
                            report,
                            persist: None,
                            dry_run: request.dry_run,
                        });
                    }
                    let new = attach_metadata(declared, request.prerelease, request.build)?
                        .to_string();
                    report.push(format!(
                        "Added {} to version: {} -> {}",
                        supplied.join(" and "),
                        declared,
                        new
                    ));
                    (Outcome::MetadataOnly, new)
                },
                Some(record) => {
                    let previous_api = ApiDescriptorSet::from_json(&record.api)?;
                    let verdict = classify(request.api, &previous_api);
                    let new = Version::parse(declared)?
                        .increment(verdict.severity)?
                        .with_metadata(request.prerelease, request.build)?
                        .to_string();

                    report.extend_findings(&verdict.findings);
                    report.push(format!("Change type: {}", verdict.severity));
                    report.push(format!("Changed version from {} to {}", declared, new));

                    let severity = verdict.severity;
                    changes = Some(verdict);
                    (Outcome::Bumped(severity), new)
                },
            }
        };

        info!(from = %declared, to = %new_version, outcome = ?outcome, "Version decided");

        let persist = (!request.dry_run).then(|| PersistInstruction {
            project: request.project.to_string(),
            digest: digest.clone(),
            api,
            mode: if previous.is_some() {
                Persistence::Update
            } else {
                Persistence::Insert
            },
        });

        Ok(Decision {
            outcome,
            previous_version: declared.to_string(),
            new_version,
            digest,
            changes,
            report,
            persist,
            dry_run: request.dry_run,
        })
    }

    /// Decide, then apply the persistence instruction
    pub fn run(&self, request: &DecisionRequest<'_>) -> Result<Decision> {
        let decision = self.decide(request)?;
        if let Some(instruction) = &decision.persist {
            self.persist(instruction)?;
        }
        Ok(decision)
    }

    pub fn persist(&self, instruction: &PersistInstruction) -> Result<()> {
        debug!(project = %instruction.project, mode = ?instruction.mode, "Persisting project record");
        match instruction.mode {
            Persistence::Insert => {
                self.store
                    .insert(&instruction.project, &instruction.digest, &instruction.api)
            },
            Persistence::Update => {
                self.store
                    .update(&instruction.project, &instruction.digest, &instruction.api)
            },
        }
    }
}
