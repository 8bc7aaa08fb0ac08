//! Structural API diffing
//!
//! Compares the current descriptor set with the previously recorded one and
//! decides how breaking the difference is.
//!
//! Major changes:
//! - functions removed
//! - positional arguments removed or re-ordered
//! - keyword arguments removed or given a different description/default
//! - return types or exceptions added or removed
//! - side effects removed
//!
//! Minor changes:
//! - functions added
//! - positional or keyword arguments added
//! - side effects added
//! - a function newly marked deprecated
//!
//! Anything else, including changes that only touch source files, is a patch.

use crate::descriptor::{ApiDescriptorSet, FunctionDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How breaking a set of API changes is
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Patch,
    Minor,
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Patch => "patch",
            Severity::Minor => "minor",
            Severity::Major => "major",
        }
    }

    /// Capitalized form used as the prefix of changelog findings
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Patch => "Patch",
            Severity::Minor => "Minor",
            Severity::Major => "Major",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "patch" => Ok(Severity::Patch),
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            _ => Err(format!("Invalid change severity: {}", s)),
        }
    }
}

/// One fact that influenced the verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    /// Function the finding is about; `None` for set-level findings
    pub function: Option<String>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.label(), self.message)
    }
}

/// Verdict of a descriptor-set comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub severity: Severity,
    pub findings: Vec<Finding>,
}

impl ChangeReport {
    /// Whether any finding was recorded at all
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    fn escalate(&mut self, severity: Severity) {
        self.severity = self.severity.max(severity);
    }
}

/// Compare `current` against `previous`.
pub fn classify(current: &ApiDescriptorSet, previous: &ApiDescriptorSet) -> ChangeReport {
    let mut report = ChangeReport::default();

    let removed: Vec<&str> = previous.names().filter(|name| !current.contains(name)).collect();
    if !removed.is_empty() {
        report.findings.push(Finding {
            severity: Severity::Major,
            function: None,
            message: format!(
                "Following functions were removed:\n    {}",
                removed.join("\n    ")
            ),
        });
        report.escalate(Severity::Major);
    }

    for (name, old) in previous.iter() {
        let Some(new) = current.get(name) else {
            continue;
        };
        let mut diff = FunctionDiff::new(name);
        diff.compare(new, old);
        report.escalate(diff.severity());
        report.findings.extend(diff.findings);
    }

    let added: Vec<&str> = current.names().filter(|name| !previous.contains(name)).collect();
    if !added.is_empty() {
        report.findings.push(Finding {
            severity: Severity::Minor,
            function: None,
            message: format!("Following functions were added:\n    {}", added.join(", ")),
        });
        report.escalate(Severity::Minor);
    }

    report
}

/// Per-function comparison state.
///
/// Additive changes only mark `deferred_minor`; it is applied after every
/// major check has run so it can never mask a major change.
struct FunctionDiff<'a> {
    name: &'a str,
    major: bool,
    deferred_minor: bool,
    findings: Vec<Finding>,
}

impl<'a> FunctionDiff<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            major: false,
            deferred_minor: false,
            findings: Vec::new(),
        }
    }

    fn severity(&self) -> Severity {
        if self.major {
            Severity::Major
        } else if self.deferred_minor {
            Severity::Minor
        } else {
            Severity::Patch
        }
    }

    fn note(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Major => self.major = true,
            Severity::Minor => self.deferred_minor = true,
            Severity::Patch => {},
        }
        self.findings.push(Finding {
            severity,
            function: Some(self.name.to_string()),
            message,
        });
    }

    fn compare(&mut self, new: &FunctionDescriptor, old: &FunctionDescriptor) {
        self.positionals(&new.arguments, &old.arguments);
        self.keywords(new, old);
        self.symmetric("return types", &new.returns, &old.returns);
        self.symmetric("exceptions", &new.exceptions, &old.exceptions);
        self.side_effects(&new.side_effects, &old.side_effects);

        if new.deprecated && !old.deprecated {
            let message = format!("{} was marked deprecated", self.name);
            self.note(Severity::Minor, message);
        }
    }

    fn positionals(&mut self, new: &[String], old: &[String]) {
        let removed: Vec<&str> = old
            .iter()
            .filter(|arg| !new.contains(arg))
            .map(String::as_str)
            .collect();

        // Every surviving argument must sit at its old index; one that now lies
        // past the end of the new list has moved as well.
        let moved: Vec<&str> = old
            .iter()
            .enumerate()
            .filter(|(index, arg)| new.contains(arg) && new.get(*index) != Some(*arg))
            .map(|(_, arg)| arg.as_str())
            .collect();

        let added: Vec<&str> = new
            .iter()
            .filter(|arg| !old.contains(arg))
            .map(String::as_str)
            .collect();

        if !removed.is_empty() {
            let message = format!(
                "Following positional arguments for {} were removed:\n    {}",
                self.name,
                removed.join(", ")
            );
            self.note(Severity::Major, message);
        }
        if !moved.is_empty() {
            let message = format!(
                "Following positional arguments for {} were moved:\n    {}",
                self.name,
                moved.join(", ")
            );
            self.note(Severity::Major, message);
        }
        if !added.is_empty() {
            let message = format!(
                "Following positional arguments for {} were added:\n    {}",
                self.name,
                added.join(", ")
            );
            self.note(Severity::Minor, message);
        }
    }

    fn keywords(&mut self, new: &FunctionDescriptor, old: &FunctionDescriptor) {
        let mut removed = Vec::new();
        let mut modified = Vec::new();
        for (key, old_value) in &old.keywords {
            match new.keywords.get(key) {
                None => removed.push(key.as_str()),
                Some(new_value) if new_value != old_value => {
                    modified.push(format!("{}: {} -> {}", key, old_value, new_value));
                },
                Some(_) => {},
            }
        }
        let added: Vec<String> = new
            .keywords
            .iter()
            .filter(|(key, _)| !old.keywords.contains_key(*key))
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();

        if !removed.is_empty() {
            let message = format!(
                "Following keyword arguments for {} were removed:\n    {}",
                self.name,
                removed.join(", ")
            );
            self.note(Severity::Major, message);
        }
        if !modified.is_empty() {
            let message = format!(
                "Following keyword arguments for {} were modified:\n    {}",
                self.name,
                modified.join("\n    ")
            );
            self.note(Severity::Major, message);
        }
        if !added.is_empty() {
            let message = format!(
                "Following keyword arguments for {} were added:\n    {}",
                self.name,
                added.join("\n    ")
            );
            self.note(Severity::Minor, message);
        }
    }

    /// Returns and exceptions: callers cannot be assumed to cope with either
    /// direction of change, so both are major.
    fn symmetric(&mut self, what: &str, new: &BTreeSet<String>, old: &BTreeSet<String>) {
        let removed: Vec<&str> = old.difference(new).map(String::as_str).collect();
        let added: Vec<&str> = new.difference(old).map(String::as_str).collect();

        if !removed.is_empty() {
            let message = format!(
                "Following {} for {} were removed:\n    {}",
                what,
                self.name,
                removed.join(", ")
            );
            self.note(Severity::Major, message);
        }
        if !added.is_empty() {
            let message = format!(
                "Following {} for {} were added:\n    {}",
                what,
                self.name,
                added.join(", ")
            );
            self.note(Severity::Major, message);
        }
    }

    fn side_effects(&mut self, new: &BTreeSet<String>, old: &BTreeSet<String>) {
        let removed: Vec<&str> = old.difference(new).map(String::as_str).collect();
        let added: Vec<&str> = new.difference(old).map(String::as_str).collect();

        if !removed.is_empty() {
            let message = format!(
                "Following side effects for {} were removed:\n    {}",
                self.name,
                removed.join(", ")
            );
            self.note(Severity::Major, message);
        }
        if !added.is_empty() {
            let message = format!(
                "Following side effects for {} were added:\n    {}",
                self.name,
                added.join(", ")
            );
            self.note(Severity::Minor, message);
        }
    }
}
