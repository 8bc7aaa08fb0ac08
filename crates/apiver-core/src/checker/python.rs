//! Python source checker
//!
//! Resolves `pkg.module.func` or `pkg.module.Class.method` to a `def` in the
//! source tree and compares its parameter list with the descriptor.

use super::{enclosed_params, split_params, ApiChecker, ParamSyntax, Scanner};
use crate::descriptor::FunctionDescriptor;
use crate::error::{ApiverError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

const SYNTAX: ParamSyntax = ParamSyntax {
    quotes: &['"', '\''],
    angle_brackets: false,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonChecker;

impl PythonChecker {
    pub fn new() -> Self {
        Self
    }
}

impl ApiChecker for PythonChecker {
    fn name(&self) -> &str {
        "python"
    }

    fn check_item(
        &self,
        name: &str,
        descriptor: &FunctionDescriptor,
        source_dir: &Path,
    ) -> Result<()> {
        let segments: Vec<&str> = name.split('.').collect();

        // Longest module prefix first
        for split in (1..segments.len()).rev() {
            let Some(module) = resolve_module(source_dir, &segments[..split]) else {
                continue;
            };
            trace!(module = %module.display(), function = %name, "Searching Python module");
            let source = fs::read_to_string(&module)?;
            if let Some(signature) = find_signature(&source, &segments[split..]) {
                return signature.compare(name, descriptor);
            }
        }

        Err(ApiverError::MissingApiFunctionality(format!(
            "Unable to locate {}",
            name
        )))
    }
}

fn resolve_module(source_dir: &Path, parts: &[&str]) -> Option<PathBuf> {
    let base: PathBuf = parts.iter().fold(source_dir.to_path_buf(), |path, part| path.join(part));
    let module = base.with_extension("py");
    if module.is_file() {
        return Some(module);
    }
    let package = base.join("__init__.py");
    package.is_file().then_some(package)
}

/// Parameters of a located `def`
#[derive(Debug, Default, PartialEq, Eq)]
struct Signature {
    positionals: Vec<String>,
    keywords: Vec<String>,
}

impl Signature {
    fn parse(params: &str, is_method: bool) -> Self {
        let mut signature = Self::default();
        let mut keyword_only = false;

        for part in split_params(&strip_comments(params), &SYNTAX) {
            match part.as_str() {
                "/" => continue,
                "*" => {
                    keyword_only = true;
                    continue;
                },
                _ => {},
            }

            if let Some(rest) = part.strip_prefix("**") {
                signature.keywords.push(format!("**{}", param_name(rest)));
            } else if let Some(rest) = part.strip_prefix('*') {
                signature.positionals.push(format!("*{}", param_name(rest)));
                keyword_only = true;
            } else if keyword_only || has_default(&part) {
                signature.keywords.push(param_name(&part).to_string());
            } else {
                signature.positionals.push(param_name(&part).to_string());
            }
        }

        if is_method
            && signature
                .positionals
                .first()
                .is_some_and(|first| first == "self" || first == "cls")
        {
            signature.positionals.remove(0);
        }

        signature
    }

    fn compare(&self, name: &str, descriptor: &FunctionDescriptor) -> Result<()> {
        let undocumented: Vec<String> = self
            .keywords
            .iter()
            .filter(|key| !descriptor.keywords.contains_key(key.as_str()) && !key.starts_with('_'))
            .map(|key| format!("'{}'", key))
            .collect();
        if !undocumented.is_empty() {
            return Err(ApiverError::MismatchedApiArgument(format!(
                "Undeclared keyword argument(s) found for '{}': {}; not declared in API",
                name,
                undocumented.join(", ")
            )));
        }

        let nonexistent: Vec<String> = descriptor
            .keywords
            .keys()
            .filter(|key| !self.keywords.contains(*key))
            .map(|key| format!("'{}'", key))
            .collect();
        if !nonexistent.is_empty() {
            return Err(ApiverError::MismatchedApiArgument(format!(
                "Keyword argument(s) declared in API not found in code for '{}': {}",
                name,
                nonexistent.join(", ")
            )));
        }

        if self.positionals.len() != descriptor.arguments.len() {
            return Err(ApiverError::MismatchedApiArgument(format!(
                "Mismatched positional arguments for '{}': {} declared in API, {} found in code",
                name,
                descriptor.arguments.len(),
                self.positionals.len()
            )));
        }

        Ok(())
    }
}

/// Locate `attr` (`[func]` or `[Class, method]`) in a module's source
fn find_signature(source: &str, attr: &[&str]) -> Option<Signature> {
    match attr {
        [function] => find_def(source, 0..source.len(), function, |indent| indent == 0)
            .map(|params| Signature::parse(params, false)),
        [class, method] => {
            let body = class_body(source, class)?;
            find_def(source, body, method, |indent| indent > 0)
                .map(|params| Signature::parse(params, true))
        },
        _ => None,
    }
}

/// Byte range of the indented block following `class <name>`
fn class_body(source: &str, name: &str) -> Option<std::ops::Range<usize>> {
    let mut offset = 0;
    let mut start = None;

    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        match start {
            None => {
                if let Some(rest) = line.strip_prefix("class ") {
                    if rest
                        .trim_start()
                        .strip_prefix(name)
                        .is_some_and(|after| after.starts_with(['(', ':']))
                    {
                        start = Some(offset);
                    }
                }
            },
            Some(body_start) => {
                let trimmed = line.trim();
                let dedented = !line.starts_with([' ', '\t']);
                if dedented && !trimmed.is_empty() && !trimmed.starts_with('#') {
                    return Some(body_start..line_start);
                }
            },
        }
    }

    start.map(|body_start| body_start..source.len())
}

/// Parameter text of the first `def <name>(` starting within `range` whose
/// indentation satisfies `indent_ok`
fn find_def<'s>(
    source: &'s str,
    range: std::ops::Range<usize>,
    name: &str,
    indent_ok: impl Fn(usize) -> bool,
) -> Option<&'s str> {
    let mut offset = range.start;

    for line in source[range].split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        if !indent_ok(indent) {
            continue;
        }

        let Some(rest) = trimmed
            .strip_prefix("async ")
            .map(str::trim_start)
            .unwrap_or(trimmed)
            .strip_prefix("def ")
        else {
            continue;
        };
        let Some(after_name) = rest.trim_start().strip_prefix(name) else {
            continue;
        };
        if !after_name.trim_start().starts_with('(') {
            continue;
        }

        let open = line_start + line.len() - after_name.trim_start().len();
        return enclosed_params(source, open, &SYNTAX);
    }

    None
}

fn param_name(part: &str) -> &str {
    part.split([':', '=']).next().unwrap_or(part).trim()
}

fn has_default(part: &str) -> bool {
    part.contains('=')
}

/// Drop `# ...` comments from a multi-line parameter list
fn strip_comments(params: &str) -> String {
    params
        .lines()
        .map(|line| {
            let mut scanner = Scanner::default();
            for (index, c) in line.char_indices() {
                if scanner.step(c, &SYNTAX) && c == '#' {
                    return &line[..index];
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LIBVH: &str = r#"import os

def parse_version(version):
    return version.split('.')

def increment_version(version, level="patch", *, strict=False, _cache=None, **options):
    pass

async def fetch(url,
                timeout=30,  # seconds, per request
                headers=None):
    pass

class Store(object):
    """Keeps records."""

    def __init__(self, path):
        self.path = path

    @classmethod
    def open(cls, path, mode="r"):
        pass

def helper(*args):
    def open(nested):
        pass

def compare(a, flag=1>0, c=2, marker='#'):  # trailing note
    pass
"#;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("libvh.py"), LIBVH).unwrap();
        fs::create_dir_all(dir.path().join("pkg/sub")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "def top(a, b):\n    pass\n").unwrap();
        fs::write(dir.path().join("pkg/sub/mod.py"), "def leaf():\n    pass\n").unwrap();
        dir
    }

    fn check(name: &str, descriptor: FunctionDescriptor) -> Result<()> {
        let dir = tree();
        PythonChecker::new().check_item(name, &descriptor, dir.path())
    }

    #[test]
    fn test_matching_function_passes() {
        check(
            "libvh.parse_version",
            FunctionDescriptor::new().with_arguments(["version"]),
        )
        .unwrap();
        check("pkg.top", FunctionDescriptor::new().with_arguments(["a", "b"])).unwrap();
        check("pkg.sub.mod.leaf", FunctionDescriptor::new()).unwrap();
    }

    #[test]
    fn test_keywords_and_star_params() {
        let descriptor = FunctionDescriptor::new()
            .with_arguments(["version"])
            .with_keyword("level", "patch")
            .with_keyword("strict", "False")
            .with_keyword("**options", "");
        check("libvh.increment_version", descriptor).unwrap();

        check(
            "libvh.helper",
            FunctionDescriptor::new().with_arguments(["*args"]),
        )
        .unwrap();
    }

    #[test]
    fn test_multiline_async_def_with_comments() {
        let descriptor = FunctionDescriptor::new()
            .with_arguments(["url"])
            .with_keyword("timeout", "30")
            .with_keyword("headers", "None");
        check("libvh.fetch", descriptor).unwrap();
    }

    #[test]
    fn test_operators_and_hashes_in_defaults() {
        let descriptor = FunctionDescriptor::new()
            .with_arguments(["a"])
            .with_keyword("flag", "True")
            .with_keyword("c", "2")
            .with_keyword("marker", "'#'");
        check("libvh.compare", descriptor).unwrap();
    }

    #[test]
    fn test_methods_drop_receiver() {
        check(
            "libvh.Store.__init__",
            FunctionDescriptor::new().with_arguments(["path"]),
        )
        .unwrap();
        check(
            "libvh.Store.open",
            FunctionDescriptor::new()
                .with_arguments(["path"])
                .with_keyword("mode", "r"),
        )
        .unwrap();
    }

    #[test]
    fn test_undeclared_keyword_is_mismatch() {
        let err = check(
            "libvh.increment_version",
            FunctionDescriptor::new().with_arguments(["version"]),
        )
        .unwrap_err();
        assert!(matches!(err, ApiverError::MismatchedApiArgument(_)));
        let message = err.to_string();
        assert!(message.contains("'level'"));
        assert!(!message.contains("_cache"));
    }

    #[test]
    fn test_declared_keyword_missing_in_code_is_mismatch() {
        let err = check(
            "libvh.parse_version",
            FunctionDescriptor::new()
                .with_arguments(["version"])
                .with_keyword("strict", "bool"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found in code"));
    }

    #[test]
    fn test_positional_count_mismatch() {
        let err = check(
            "libvh.parse_version",
            FunctionDescriptor::new().with_arguments(["version", "extra"]),
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("2 declared in API, 1 found in code"));
    }

    #[test]
    fn test_unknown_function_is_missing() {
        for name in ["libvh.nope", "nomodule.f", "libvh.open", "libvh.Store.close"] {
            let err = check(name, FunctionDescriptor::new()).unwrap_err();
            assert!(
                matches!(err, ApiverError::MissingApiFunctionality(_)),
                "{} should be missing",
                name
            );
        }
    }

    #[test]
    fn test_signature_parse() {
        let signature = Signature::parse("self, a: int, /, b: str = 'x, y', *rest, c, **kw", true);
        assert_eq!(signature.positionals, vec!["a", "*rest"]);
        assert_eq!(signature.keywords, vec!["b", "c", "**kw"]);
    }
}
