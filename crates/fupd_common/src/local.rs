//! Parser for the executable's `--version` self-report.
//!
//! The first banner line looks like
//!
//! ```text
//! Version: 1.1.110 (build 62622, linux64, headless)
//! ```
//!
//! followed by map format lines that are ignored. One strict pattern, no
//! best-effort extraction: output that deviates is rejected with the full
//! text attached so the mismatch can be diagnosed.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::version::FactorioVersion;

static BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Version:\s(\d+\.\d+\.\d+)\s\(build\s(\d+),\s([^,]+),\s([^)]+)\)").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("no version banner in executable output:\n{output}")]
    UnparsableOutput { output: String },
    #[error("executable reports platform \"{found}\", this deployment expects \"{expected}\"")]
    UnsupportedPlatform { found: String, expected: String },
    #[error("executable reports build \"{found}\", this deployment expects \"{expected}\"")]
    UnsupportedBuildTag { found: String, expected: String },
}

/// What the installed executable reports about itself. Re-derived on every
/// probe, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInstall {
    pub version: FactorioVersion,
    pub build_number: String,
    pub platform: String,
    pub build_tag: String,
}

/// Parse a `--version` banner and check it against the platform and build
/// tag this deployment targets.
pub fn parse_version_banner(
    output: &str,
    expected_platform: &str,
    expected_build: &str,
) -> Result<LocalInstall, ProbeError> {
    let unparsable = || ProbeError::UnparsableOutput {
        output: output.to_string(),
    };

    let captures = BANNER.captures(output.trim()).ok_or_else(unparsable)?;
    // The regex guarantees three digit groups; only u32 overflow can fail.
    let version: FactorioVersion = captures[1].parse().map_err(|_| unparsable())?;
    let platform = &captures[3];
    let build_tag = &captures[4];

    if platform != expected_platform {
        return Err(ProbeError::UnsupportedPlatform {
            found: platform.to_string(),
            expected: expected_platform.to_string(),
        });
    }
    if build_tag != expected_build {
        return Err(ProbeError::UnsupportedBuildTag {
            found: build_tag.to_string(),
            expected: expected_build.to_string(),
        });
    }

    Ok(LocalInstall {
        version,
        build_number: captures[2].to_string(),
        platform: platform.to_string(),
        build_tag: build_tag.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER_TEXT: &str = "Version: 1.0.0 (build 1, linux64, headless)\n\
        Version: 64\n\
        Map input version: 1.0.0-0\n\
        Map output version: 1.0.0-0";

    #[test]
    fn parses_a_full_banner() {
        let install = parse_version_banner(BANNER_TEXT, "linux64", "headless").unwrap();
        assert_eq!(
            install,
            LocalInstall {
                version: FactorioVersion::new(1, 0, 0),
                build_number: "1".to_string(),
                platform: "linux64".to_string(),
                build_tag: "headless".to_string(),
            }
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let text = format!("\n  {BANNER_TEXT}\n");
        let install = parse_version_banner(&text, "linux64", "headless").unwrap();
        assert_eq!(install.version, FactorioVersion::new(1, 0, 0));
    }

    #[test]
    fn wrong_platform_is_rejected() {
        let err = parse_version_banner(BANNER_TEXT, "linux32", "headless").unwrap_err();
        assert_eq!(
            err,
            ProbeError::UnsupportedPlatform {
                found: "linux64".to_string(),
                expected: "linux32".to_string(),
            }
        );
    }

    #[test]
    fn wrong_build_tag_is_rejected() {
        let err = parse_version_banner(BANNER_TEXT, "linux64", "alpha").unwrap_err();
        assert_eq!(
            err,
            ProbeError::UnsupportedBuildTag {
                found: "headless".to_string(),
                expected: "alpha".to_string(),
            }
        );
    }

    #[test]
    fn garbage_output_is_unparsable() {
        for bad in [
            "",
            "factorio: command not found",
            "Version: 64",
            "Version: 1.0.0",
            "Version: 1.0.0 (linux64, headless)",
            "something\nVersion: 1.0.0 (build 1, linux64, headless)",
        ] {
            let err = parse_version_banner(bad, "linux64", "headless").unwrap_err();
            assert!(
                matches!(err, ProbeError::UnparsableOutput { .. }),
                "{bad:?} should be unparsable"
            );
        }
    }

    #[test]
    fn unparsable_error_carries_the_output() {
        let err = parse_version_banner("strange output", "linux64", "headless").unwrap_err();
        assert!(err.to_string().contains("strange output"));
    }
}
