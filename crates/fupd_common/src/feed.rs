//! Strict reader for the latest-releases document.
//!
//! The document maps channel to build tag to version string:
//!
//! ```json
//! {"stable": {"headless": "1.1.110", ...}, "experimental": {...}}
//! ```
//!
//! The reader rejects any deviation on the requested path and carries the
//! rendered document in the error, so a malformed feed can be diagnosed from
//! the log alone.

use serde_json::Value;
use thiserror::Error;

use crate::release::{ReleaseBuild, ReleaseChannel};
use crate::version::FactorioVersion;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("release feed has no \"{channel}\" entry: {document}")]
    MissingChannel {
        channel: ReleaseChannel,
        document: String,
    },
    #[error("release feed \"{channel}\" entry is not an object: {document}")]
    WrongShape {
        channel: ReleaseChannel,
        document: String,
    },
    #[error("release feed \"{channel}\" entry has no \"{build}\" build: {document}")]
    MissingBuild {
        channel: ReleaseChannel,
        build: ReleaseBuild,
        document: String,
    },
    #[error("release feed value for {channel}/{build} is not a version string: {document}")]
    InvalidVersion {
        channel: ReleaseChannel,
        build: ReleaseBuild,
        document: String,
    },
}

/// Extract the latest version for `channel` and `build` from a parsed
/// latest-releases document.
pub fn latest_release(
    doc: &Value,
    channel: ReleaseChannel,
    build: ReleaseBuild,
) -> Result<FactorioVersion, FeedError> {
    let entry = doc
        .get(channel.as_str())
        .ok_or_else(|| FeedError::MissingChannel {
            channel,
            document: doc.to_string(),
        })?;
    let builds = entry.as_object().ok_or_else(|| FeedError::WrongShape {
        channel,
        document: doc.to_string(),
    })?;
    let version = builds
        .get(build.as_str())
        .ok_or_else(|| FeedError::MissingBuild {
            channel,
            build,
            document: doc.to_string(),
        })?;
    version
        .as_str()
        .and_then(|raw| raw.parse::<FactorioVersion>().ok())
        .ok_or_else(|| FeedError::InvalidVersion {
            channel,
            build,
            document: doc.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_the_requested_channel_and_build() {
        let doc = json!({
            "stable": {"alpha": "1.1.0", "headless": "1.1.0"},
            "experimental": {"headless": "1.1.1"},
        });
        assert_eq!(
            latest_release(&doc, ReleaseChannel::Stable, ReleaseBuild::Headless),
            Ok(FactorioVersion::new(1, 1, 0))
        );
        assert_eq!(
            latest_release(&doc, ReleaseChannel::Experimental, ReleaseBuild::Headless),
            Ok(FactorioVersion::new(1, 1, 1))
        );
    }

    #[test]
    fn missing_channel_is_reported() {
        let doc = json!({"stable": {"headless": "1.1.0"}});
        let err = latest_release(&doc, ReleaseChannel::Experimental, ReleaseBuild::Headless)
            .unwrap_err();
        assert!(matches!(err, FeedError::MissingChannel { channel, .. }
            if channel == ReleaseChannel::Experimental));
    }

    #[test]
    fn channel_entry_must_be_an_object() {
        let doc = json!({"stable": "1.1.0"});
        let err = latest_release(&doc, ReleaseChannel::Stable, ReleaseBuild::Headless).unwrap_err();
        assert!(matches!(err, FeedError::WrongShape { .. }));
    }

    #[test]
    fn missing_build_is_reported() {
        let doc = json!({"stable": {"headless": "1.1.0"}});
        let err = latest_release(&doc, ReleaseChannel::Stable, ReleaseBuild::Alpha).unwrap_err();
        assert!(matches!(err, FeedError::MissingBuild { build, .. }
            if build == ReleaseBuild::Alpha));
    }

    #[test]
    fn non_version_values_are_rejected() {
        for value in [json!("not-a-version"), json!(110), json!(null), json!(["1.1.0"])] {
            let doc = json!({"stable": {"headless": value}});
            let err =
                latest_release(&doc, ReleaseChannel::Stable, ReleaseBuild::Headless).unwrap_err();
            assert!(matches!(err, FeedError::InvalidVersion { .. }));
        }
    }

    #[test]
    fn errors_carry_the_document() {
        let doc = json!({"weird": true});
        let err = latest_release(&doc, ReleaseChannel::Stable, ReleaseBuild::Headless).unwrap_err();
        assert!(err.to_string().contains("\"weird\":true"));
    }

    #[test]
    fn non_object_documents_lack_every_channel() {
        let doc = json!(["stable"]);
        let err = latest_release(&doc, ReleaseChannel::Stable, ReleaseBuild::Headless).unwrap_err();
        assert!(matches!(err, FeedError::MissingChannel { .. }));
    }
}
