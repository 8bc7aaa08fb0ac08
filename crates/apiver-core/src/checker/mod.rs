//! Invariant checkers
//!
//! A checker confirms that a declared function descriptor matches the real
//! implementation found under the source directory. Checkers are tried as a
//! fallback chain: the first one that accepts an item wins, and if every
//! checker rejects it the last rejection is reported.

mod process;
mod python;
mod rust;

pub use process::ProcessChecker;
pub use python::PythonChecker;
pub use rust::RustChecker;

use crate::descriptor::{ApiDescriptorSet, FunctionDescriptor};
use crate::error::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Validates one declared function against the sources
pub trait ApiChecker {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// `Ok(())` when `descriptor` matches the implementation of `name`.
    ///
    /// Returns `MissingApiFunctionality` when the function cannot be found and
    /// `MismatchedApiArgument` when its signature disagrees with the
    /// descriptor. Any other error means the checker itself could not run.
    fn check_item(&self, name: &str, descriptor: &FunctionDescriptor, source_dir: &Path)
        -> Result<()>;
}

/// Built-in checker for `language`, if one exists
pub fn builtin(language: &str) -> Option<Box<dyn ApiChecker>> {
    match language.to_lowercase().as_str() {
        "python" => Some(Box::new(PythonChecker::new())),
        "rust" => Some(Box::new(RustChecker::new())),
        _ => None,
    }
}

/// Ordered list of checkers tried per item
#[derive(Default)]
pub struct CheckerChain {
    checkers: Vec<Box<dyn ApiChecker>>,
}

impl CheckerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in checkers for the given languages.
    ///
    /// Returns the chain together with the languages that have no built-in
    /// checker.
    pub fn for_languages<S: AsRef<str>>(languages: &[S]) -> (Self, Vec<String>) {
        let mut chain = Self::new();
        let mut unsupported = Vec::new();
        for language in languages {
            match builtin(language.as_ref()) {
                Some(checker) => chain.push(checker),
                None => unsupported.push(language.as_ref().to_string()),
            }
        }
        (chain, unsupported)
    }

    pub fn push(&mut self, checker: Box<dyn ApiChecker>) {
        self.checkers.push(checker);
    }

    pub fn with(mut self, checker: Box<dyn ApiChecker>) -> Self {
        self.push(checker);
        self
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.checkers.iter().map(|checker| checker.name()).collect()
    }

    /// Try each checker in order; first success wins.
    ///
    /// A checker that fails to run aborts the chain immediately. An empty
    /// chain accepts everything.
    pub fn check_item(
        &self,
        name: &str,
        descriptor: &FunctionDescriptor,
        source_dir: &Path,
    ) -> Result<()> {
        let mut last_failure = None;

        for checker in &self.checkers {
            match checker.check_item(name, descriptor, source_dir) {
                Ok(()) => {
                    debug!(function = %name, checker = checker.name(), "Declared function verified");
                    return Ok(());
                },
                Err(err) if err.is_check_failure() => {
                    debug!(function = %name, checker = checker.name(), error = %err, "Checker rejected function");
                    last_failure = Some(err);
                },
                Err(err) => return Err(err),
            }
        }

        match last_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Check every declared function; returns the first failure after all
    /// items have been checked
    pub fn check_all(&self, api: &ApiDescriptorSet, source_dir: &Path) -> Result<()> {
        let mut first_failure = None;

        for (name, descriptor) in api.iter() {
            match self.check_item(name, descriptor, source_dir) {
                Ok(()) => {},
                Err(err) if err.is_check_failure() => {
                    warn!(function = %name, error = %err, "API check failed");
                    first_failure.get_or_insert(err);
                },
                Err(err) => return Err(err),
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Lexical rules for scanning a parameter list
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParamSyntax {
    /// String delimiters
    pub quotes: &'static [char],
    /// Whether `<`/`>` nest like brackets (Rust generics)
    pub angle_brackets: bool,
}

/// Tracks string literals and bracket depth while scanning
#[derive(Debug, Default)]
pub(crate) struct Scanner {
    depth: i32,
    quote: Option<char>,
    escaped: bool,
    previous: char,
}

impl Scanner {
    /// Feed one character; returns whether it sits outside any string
    pub(crate) fn step(&mut self, c: char, syntax: &ParamSyntax) -> bool {
        let previous = std::mem::replace(&mut self.previous, c);

        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == q {
                self.quote = None;
            }
            return false;
        }

        match c {
            c if syntax.quotes.contains(&c) => self.quote = Some(c),
            '(' | '[' | '{' => self.depth += 1,
            ')' | ']' | '}' => self.depth -= 1,
            '<' if syntax.angle_brackets => self.depth += 1,
            // `->` in a Rust fn-pointer type is not a closing bracket
            '>' if syntax.angle_brackets && previous != '-' => self.depth -= 1,
            _ => {},
        }
        true
    }
}

/// Split a parameter list at top-level commas.
///
/// Brackets and string literals are respected so defaults such as
/// `sep=", "` or types such as `Vec<(u8, u8)>` stay in one piece.
pub(crate) fn split_params(params: &str, syntax: &ParamSyntax) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut scanner = Scanner::default();

    for c in params.chars() {
        let code = scanner.step(c, syntax);
        if code && c == ',' && scanner.depth == 0 {
            parts.push(std::mem::take(&mut current));
            continue;
        }
        current.push(c);
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Text between the `(` at `open` and its matching `)`
pub(crate) fn enclosed_params<'t>(
    text: &'t str,
    open: usize,
    syntax: &ParamSyntax,
) -> Option<&'t str> {
    let mut scanner = Scanner::default();
    for (offset, c) in text[open..].char_indices() {
        let code = scanner.step(c, syntax);
        if code && c == ')' && scanner.depth == 0 {
            return Some(&text[open + 1..open + offset]);
        }
    }
    None
}
