//! Semantic version algebra
//!
//! Parses, formats and advances `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`
//! versions. Prerelease and build identifiers are dot-separated ASCII
//! alphanumerics; numeric prerelease identifiers carry no leading zeros.

use crate::classify::Severity;
use crate::error::{ApiverError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which metadata grammar an identifier list is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// Text after `-`
    Prerelease,
    /// Text after `+`
    BuildMetadata,
}

/// A parsed semantic version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

impl Version {
    /// Create a release version without metadata
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Parse a version string.
    ///
    /// The core triple is taken from the first two `.`; the remaining token
    /// carries the patch number followed by optional `-prerelease` and
    /// `+build` suffixes.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parts = input.splitn(3, '.');
        let (Some(major), Some(minor), Some(rest)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ApiverError::InvalidVersion(input.to_string()));
        };

        let (patch, prerelease, build) = split_suffixes(rest);

        let version = Self {
            major: parse_core(major, input)?,
            minor: parse_core(minor, input)?,
            patch: parse_core(patch, input)?,
            prerelease: prerelease.map(str::to_string),
            build: build.map(str::to_string),
        };

        if let Some(pre) = &version.prerelease {
            validate_identifiers(pre, IdentifierKind::Prerelease)?;
        }
        if let Some(build) = &version.build {
            validate_identifiers(build, IdentifierKind::BuildMetadata)?;
        }

        Ok(version)
    }

    /// Numeric core as a tuple, ordered lexicographically
    pub fn core_triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// Whether the version carries a non-empty prerelease label
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.as_deref().is_some_and(|pre| !pre.is_empty())
    }

    /// Advance the version according to `severity`.
    ///
    /// A version already in prerelease only iterates its prerelease counter
    /// and ignores `severity`. Build metadata is never carried over. Fails
    /// with [`ApiverError::VersionOverflow`] when the core number to bump is
    /// already `u64::MAX`.
    pub fn increment(&self, severity: Severity) -> Result<Self> {
        let mut next = Self {
            build: None,
            ..self.clone()
        };

        if let Some(pre) = self.prerelease.as_deref().filter(|pre| !pre.is_empty()) {
            next.prerelease = Some(advance_prerelease(pre));
            return Ok(next);
        }

        let overflow = || ApiverError::VersionOverflow(self.to_string());
        match severity {
            Severity::Major if self.major != 0 => {
                next.major = self.major.checked_add(1).ok_or_else(overflow)?;
                next.minor = 0;
                next.patch = 0;
            },
            // Before 1.0 a breaking change still only moves the minor number
            Severity::Major | Severity::Minor => {
                next.minor = self.minor.checked_add(1).ok_or_else(overflow)?;
                next.patch = 0;
            },
            Severity::Patch => next.patch = self.patch.checked_add(1).ok_or_else(overflow)?,
        }

        Ok(next)
    }

    /// Replace prerelease and/or build metadata.
    ///
    /// `None` or an empty string leaves the corresponding suffix untouched.
    pub fn with_metadata(mut self, prerelease: Option<&str>, build: Option<&str>) -> Result<Self> {
        if let Some(pre) = prerelease.filter(|pre| !pre.is_empty()) {
            validate_identifiers(pre, IdentifierKind::Prerelease)?;
            self.prerelease = Some(pre.to_string());
        }
        if let Some(build) = build.filter(|build| !build.is_empty()) {
            validate_identifiers(build, IdentifierKind::BuildMetadata)?;
            self.build = Some(build.to_string());
        }
        Ok(self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ApiverError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ApiverError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// Parse `version` and layer the given metadata on top of it
pub fn attach_metadata(
    version: &str,
    prerelease: Option<&str>,
    build: Option<&str>,
) -> Result<Version> {
    Version::parse(version)?.with_metadata(prerelease, build)
}

/// Parse `version` and advance it by `severity`
pub fn increment(version: &str, severity: Severity) -> Result<Version> {
    Version::parse(version)?.increment(severity)
}

/// Validate a dot-separated identifier list against the prerelease or
/// build-metadata grammar
pub fn validate_identifiers(text: &str, kind: IdentifierKind) -> Result<()> {
    let fail = |reason: &str| match kind {
        IdentifierKind::Prerelease => ApiverError::invalid_prerelease(text, reason),
        IdentifierKind::BuildMetadata => ApiverError::invalid_build_metadata(text, reason),
    };

    for segment in text.split('.') {
        if segment.is_empty() {
            return Err(fail("contains an empty identifier"));
        }
        if !segment.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(fail("contains non-alphanumeric ASCII"));
        }
        if kind == IdentifierKind::Prerelease
            && segment.len() > 1
            && segment.starts_with('0')
            && segment.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(fail("numeric identifier has leading zeros"));
        }
    }

    Ok(())
}

/// Split `patch[-prerelease][+build]`; a `+` before any `-` starts build metadata
fn split_suffixes(token: &str) -> (&str, Option<&str>, Option<&str>) {
    let (head, build) = match token.split_once('+') {
        Some((head, build)) => (head, Some(build)),
        None => (token, None),
    };
    match head.split_once('-') {
        Some((patch, pre)) => (patch, Some(pre), build),
        None => (head, None, build),
    }
}

fn parse_core(segment: &str, input: &str) -> Result<u64> {
    let well_formed = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if !well_formed {
        return Err(ApiverError::InvalidVersion(input.to_string()));
    }
    segment
        .parse()
        .map_err(|_| ApiverError::InvalidVersion(input.to_string()))
}

/// Bump the last numeric identifier, or append `0` when there is none.
///
/// Numeric identifiers have no width limit, so they are advanced as decimal
/// strings.
fn advance_prerelease(prerelease: &str) -> String {
    let mut segments: Vec<String> = prerelease.split('.').map(str::to_string).collect();

    for segment in segments.iter_mut().rev() {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            *segment = increment_decimal(segment);
            return segments.join(".");
        }
    }

    segments.push("0".to_string());
    segments.join(".")
}

fn increment_decimal(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    let mut carry = true;
    for digit in out.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            carry = false;
            break;
        }
    }
    if carry {
        out.insert(0, b'1');
    }
    out.into_iter().map(char::from).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bump(version: &str, severity: Severity) -> String {
        increment(version, severity).unwrap().to_string()
    }

    #[test]
    fn test_parse_full_version() {
        let version = Version::parse("1.2.3-beta.4+build.9").unwrap();
        assert_eq!(version.core_triple(), (1, 2, 3));
        assert_eq!(version.prerelease.as_deref(), Some("beta.4"));
        assert_eq!(version.build.as_deref(), Some("build.9"));
    }

    #[test]
    fn test_parse_build_without_prerelease() {
        let version = Version::parse("1.2.3+exp.sha.5114f85").unwrap();
        assert_eq!(version.prerelease, None);
        assert_eq!(version.build.as_deref(), Some("exp.sha.5114f85"));
    }

    #[test]
    fn test_parse_rejects_short_versions() {
        assert!(matches!(Version::parse("1.2"), Err(ApiverError::InvalidVersion(_))));
        assert!(matches!(Version::parse("1"), Err(ApiverError::InvalidVersion(_))));
        assert!(matches!(Version::parse(""), Err(ApiverError::InvalidVersion(_))));
    }

    #[test]
    fn test_parse_rejects_non_numeric_core() {
        assert!(Version::parse("1.x.3").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("01.2.3").is_err());
        assert!(Version::parse("1.2.-3").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_metadata() {
        assert!(matches!(
            Version::parse("1.2.3-"),
            Err(ApiverError::InvalidPrerelease { .. })
        ));
        assert!(matches!(
            Version::parse("1.2.3+exp..1"),
            Err(ApiverError::InvalidBuildMetadata { .. })
        ));
    }

    #[test]
    fn test_major_bump_pre_stable() {
        assert_eq!(bump("0.3.2", Severity::Major), "0.4.0");
        assert_eq!(bump("1.3.2", Severity::Major), "2.0.0");
    }

    #[test]
    fn test_minor_and_patch_bumps() {
        assert_eq!(bump("1.3.2", Severity::Minor), "1.4.0");
        assert_eq!(bump("1.3.2", Severity::Patch), "1.3.3");
        assert_eq!(bump("0.0.9", Severity::Minor), "0.1.0");
    }

    #[test]
    fn test_prerelease_iteration_ignores_severity() {
        assert_eq!(bump("1.2.3-beta.4", Severity::Major), "1.2.3-beta.5");
        assert_eq!(bump("1.2.3-beta", Severity::Patch), "1.2.3-beta.0");
        assert_eq!(bump("1.2.3-beta", Severity::Major), "1.2.3-beta.0");
        // Scanning starts from the end
        assert_eq!(bump("1.2.3-2.rc.7", Severity::Minor), "1.2.3-2.rc.8");
        assert_eq!(bump("1.2.3-1.rc", Severity::Minor), "1.2.3-2.rc");
    }

    #[test]
    fn test_prerelease_counters_have_no_width_limit() {
        assert_eq!(
            bump("1.2.3-beta.18446744073709551615", Severity::Patch),
            "1.2.3-beta.18446744073709551616"
        );
        assert_eq!(
            bump("1.2.3-beta.99999999999999999999", Severity::Patch),
            "1.2.3-beta.100000000000000000000"
        );
        assert_eq!(bump("1.2.3-rc.9", Severity::Minor), "1.2.3-rc.10");
        assert_eq!(bump("1.2.3-0", Severity::Minor), "1.2.3-1");
    }

    #[test]
    fn test_core_overflow_is_an_error() {
        let max = u64::MAX;
        for (version, severity) in [
            (format!("{}.0.0", max), Severity::Major),
            (format!("1.{}.0", max), Severity::Minor),
            (format!("0.{}.0", max), Severity::Major),
            (format!("1.2.{}", max), Severity::Patch),
        ] {
            assert!(matches!(
                increment(&version, severity),
                Err(ApiverError::VersionOverflow(ref v)) if *v == version
            ));
        }
        // Other components may sit at the maximum
        assert_eq!(
            bump(&format!("1.2.{}", max), Severity::Minor),
            "1.3.0"
        );
    }

    #[test]
    fn test_increment_drops_build_metadata() {
        assert_eq!(bump("1.2.3+build.7", Severity::Patch), "1.2.4");
        assert_eq!(bump("1.2.3-rc.1+build.7", Severity::Patch), "1.2.3-rc.2");
    }

    #[test]
    fn test_attach_metadata() {
        let v = attach_metadata("1.2.3", Some("alpha.1"), None).unwrap();
        assert_eq!(v.to_string(), "1.2.3-alpha.1");

        let v = attach_metadata("1.2.3-beta+old", Some("rc.1"), None).unwrap();
        assert_eq!(v.to_string(), "1.2.3-rc.1+old");

        let v = attach_metadata("1.2.3-beta+old", None, Some("new.2")).unwrap();
        assert_eq!(v.to_string(), "1.2.3-beta+new.2");

        let v = attach_metadata("1.2.3", Some(""), None).unwrap();
        assert_eq!(v.to_string(), "1.2.3");
    }

    #[test]
    fn test_metadata_validation() {
        let err = attach_metadata("1.2.3", Some("01.2"), None).unwrap_err();
        assert!(matches!(err, ApiverError::InvalidPrerelease { ref value, .. } if value == "01.2"));

        let err = attach_metadata("1.2.3", None, Some("exp..1")).unwrap_err();
        assert!(matches!(err, ApiverError::InvalidBuildMetadata { ref value, .. } if value == "exp..1"));

        assert!(attach_metadata("1.2.3", Some("beta_1"), None).is_err());
        // Leading zeros are fine in build metadata and in alphanumeric identifiers
        assert!(attach_metadata("1.2.3", Some("0a.0"), Some("001")).is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let version: Version = serde_json::from_str("\"2.0.0-rc.1\"").unwrap();
        assert_eq!(version.core_triple(), (2, 0, 0));
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"2.0.0-rc.1\"");
        assert!(serde_json::from_str::<Version>("\"2.0\"").is_err());
    }

    fn arb_prerelease() -> impl Strategy<Value = String> {
        let identifier = prop_oneof![
            "[a-zA-Z][a-zA-Z0-9]{0,6}",
            any::<u16>().prop_map(|n| n.to_string()),
        ];
        prop::collection::vec(identifier, 1..4).prop_map(|ids| ids.join("."))
    }

    fn arb_build() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z0-9]{1,6}", 1..4).prop_map(|ids| ids.join("."))
    }

    fn arb_severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Major),
            Just(Severity::Minor),
            Just(Severity::Patch),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_format_parse_round_trip(
            major in 0u64..100_000,
            minor in 0u64..100_000,
            patch in 0u64..100_000,
            pre in prop::option::of(arb_prerelease()),
            build in prop::option::of(arb_build()),
        ) {
            let mut text = format!("{}.{}.{}", major, minor, patch);
            if let Some(pre) = &pre {
                text.push('-');
                text.push_str(pre);
            }
            if let Some(build) = &build {
                text.push('+');
                text.push_str(build);
            }

            let parsed = Version::parse(&text).unwrap();
            prop_assert_eq!(parsed.to_string(), text);
        }

        #[test]
        fn prop_increment_is_monotonic(
            major in 0u64..100_000,
            minor in 0u64..100_000,
            patch in 0u64..100_000,
            severity in arb_severity(),
        ) {
            let version = Version::new(major, minor, patch);
            let next = version.increment(severity).unwrap();
            prop_assert!(next.core_triple() > version.core_triple());
        }
    }
}
