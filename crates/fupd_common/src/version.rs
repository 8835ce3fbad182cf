//! Factorio version numbers.
//!
//! Upstream version strings are exactly three dot-separated decimal groups
//! (`1.1.110`). Parsing is strict: no `v` prefix, no pre-release suffix, no
//! surrounding whitespace. The chain walk only needs equality, but ordering
//! is numeric by (major, minor, patch) so callers can reason about direction.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("\"{0}\" is not a version string (expected MAJOR.MINOR.PATCH)")]
    InvalidFormat(String),
}

/// A Factorio version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactorioVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FactorioVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for FactorioVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn group(part: Option<&str>) -> Option<u32> {
            let part = part?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse().ok()
        }

        let mut parts = s.split('.');
        let parsed = (
            group(parts.next()),
            group(parts.next()),
            group(parts.next()),
            parts.next(),
        );
        match parsed {
            (Some(major), Some(minor), Some(patch), None) => Ok(Self {
                major,
                minor,
                patch,
            }),
            _ => Err(VersionError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for FactorioVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> FactorioVersion {
        s.parse().unwrap()
    }

    #[test]
    fn parses_well_formed_versions() {
        assert_eq!(v("1.0.0"), FactorioVersion::new(1, 0, 0));
        assert_eq!(v("0.0.0"), FactorioVersion::new(0, 0, 0));
        assert_eq!(v("2.0.28"), FactorioVersion::new(2, 0, 28));
        assert_eq!(v("10.20.30"), FactorioVersion::new(10, 20, 30));
    }

    #[test]
    fn rejects_everything_else() {
        for bad in [
            "",
            "1",
            "1.2",
            "1.2.3.4",
            "1.2.",
            ".2.3",
            "1..3",
            "a.b.c",
            "1.2.x",
            " 1.2.3",
            "1.2.3 ",
            "1.2.3\n",
            "v1.2.3",
            "-1.2.3",
            "1.2.-3",
            "1.2.3-0",
        ] {
            let result = bad.parse::<FactorioVersion>();
            assert_eq!(
                result,
                Err(VersionError::InvalidFormat(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn display_and_parse_round_trip() {
        for s in ["0.0.0", "1.0.0", "1.1.110", "2.0.28"] {
            assert_eq!(v(s).to_string(), s);
        }
        let version = FactorioVersion::new(1, 1, 110);
        assert_eq!(version.to_string().parse::<FactorioVersion>(), Ok(version));
    }

    #[test]
    fn ordering_is_numeric_not_lexicographic() {
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert!(v("0.1.0") < v("0.1.1"));
        assert!(v("1.0.0") < v("1.1.0"));
    }

    #[test]
    fn error_mentions_the_offending_string() {
        let err = "not-a-version".parse::<FactorioVersion>().unwrap_err();
        assert!(err.to_string().contains("not-a-version"));
    }
}
