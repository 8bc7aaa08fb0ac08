//! Rust source checker
//!
//! Matches the last path segment of a declared name against `fn` items in the
//! `.rs` files under the source directory and compares parameter counts.

use super::{enclosed_params, split_params, ApiChecker, ParamSyntax};
use crate::descriptor::FunctionDescriptor;
use crate::digest::{collect_source_files, SourceTypes};
use crate::error::{ApiverError, Result};
use std::fs;
use std::path::Path;

const SYNTAX: ParamSyntax = ParamSyntax {
    quotes: &['"'],
    angle_brackets: true,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct RustChecker;

impl RustChecker {
    pub fn new() -> Self {
        Self
    }
}

impl ApiChecker for RustChecker {
    fn name(&self) -> &str {
        "rust"
    }

    fn check_item(
        &self,
        name: &str,
        descriptor: &FunctionDescriptor,
        source_dir: &Path,
    ) -> Result<()> {
        let function = name.rsplit(|c: char| c == ':' || c == '.').next().unwrap_or(name);
        let missing = || ApiverError::MissingApiFunctionality(format!("Unable to locate {}", name));

        if function.is_empty() || !source_dir.is_dir() {
            return Err(missing());
        }

        if !descriptor.keywords.is_empty() {
            let declared: Vec<&str> = descriptor.keywords.keys().map(String::as_str).collect();
            return Err(ApiverError::MismatchedApiArgument(format!(
                "Rust functions take no keyword arguments; '{}' declares: {}",
                name,
                declared.join(", ")
            )));
        }

        let rust_sources = SourceTypes::from_extensions(["rs"]);
        let mut found = Vec::new();
        for path in collect_source_files(source_dir, &rust_sources, None)? {
            let source = fs::read_to_string(&path)?;
            found.extend(parameter_counts(&source, function));
        }

        let Some(&first) = found.first() else {
            return Err(missing());
        };
        if found.contains(&descriptor.arguments.len()) {
            return Ok(());
        }

        Err(ApiverError::MismatchedApiArgument(format!(
            "Mismatched positional arguments for '{}': {} declared in API, {} found in code",
            name,
            descriptor.arguments.len(),
            first
        )))
    }
}

/// Non-receiver parameter count of every `fn <name>` in `source`
fn parameter_counts(source: &str, name: &str) -> Vec<usize> {
    let needle = format!("fn {}", name);
    let mut counts = Vec::new();

    for (index, _) in source.match_indices(&needle) {
        let line_start = source[..index].rfind('\n').map_or(0, |i| i + 1);
        if source[line_start..index].contains("//") {
            continue;
        }
        if source[..index]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            continue;
        }

        let after = index + needle.len();
        let Some(open) = parameter_list_start(source, after) else {
            continue;
        };
        if let Some(params) = enclosed_params(source, open, &SYNTAX) {
            let count = split_params(params, &SYNTAX)
                .iter()
                .filter(|param| !is_receiver(param))
                .count();
            counts.push(count);
        }
    }

    counts
}

/// Index of the `(` opening the parameter list, skipping generics
fn parameter_list_start(source: &str, after_name: usize) -> Option<usize> {
    let rest = &source[after_name..];
    let trimmed = rest.trim_start();
    let mut index = after_name + rest.len() - trimmed.len();

    match trimmed.chars().next()? {
        '(' => Some(index),
        '<' => {
            let mut depth = 0i32;
            let mut previous = '\0';
            for (offset, c) in trimmed.char_indices() {
                match c {
                    '<' => depth += 1,
                    '>' if previous != '-' => {
                        depth -= 1;
                        if depth == 0 {
                            index += offset + 1;
                            let tail = &source[index..];
                            let open = index + tail.len() - tail.trim_start().len();
                            return source[open..].starts_with('(').then_some(open);
                        }
                    },
                    _ => {},
                }
                previous = c;
            }
            None
        },
        // Identifier continues: `fn name_suffix`
        _ => None,
    }
}

fn is_receiver(param: &str) -> bool {
    let mut param = param.trim_start_matches('&').trim_start();
    if param.starts_with('\'') {
        param = param
            .split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest.trim_start());
    }
    let param = param.strip_prefix("mut ").unwrap_or(param).trim_start();
    param == "self" || param.starts_with("self:") || param.starts_with("self ")
}
