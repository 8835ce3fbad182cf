//! Release channels and build tags.
//!
//! Both are closed sets of keys used by the latest-releases document. The
//! build tag also appears in the local executable's version banner.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Remote release track to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseChannel {
    Stable,
    Experimental,
}

impl ReleaseChannel {
    pub const ALL: [ReleaseChannel; 2] = [ReleaseChannel::Stable, ReleaseChannel::Experimental];

    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseChannel::Stable => "stable",
            ReleaseChannel::Experimental => "experimental",
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown release channel \"{0}\" (expected \"stable\" or \"experimental\")")]
pub struct UnknownChannel(pub String);

impl FromStr for ReleaseChannel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(ReleaseChannel::Stable),
            "experimental" => Ok(ReleaseChannel::Experimental),
            other => Err(UnknownChannel(other.to_string())),
        }
    }
}

/// Build flavor of an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseBuild {
    Alpha,
    Demo,
    Expansion,
    Headless,
}

impl ReleaseBuild {
    pub const ALL: [ReleaseBuild; 4] = [
        ReleaseBuild::Alpha,
        ReleaseBuild::Demo,
        ReleaseBuild::Expansion,
        ReleaseBuild::Headless,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseBuild::Alpha => "alpha",
            ReleaseBuild::Demo => "demo",
            ReleaseBuild::Expansion => "expansion",
            ReleaseBuild::Headless => "headless",
        }
    }
}

impl fmt::Display for ReleaseBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown build tag \"{0}\" (expected \"alpha\", \"demo\", \"expansion\" or \"headless\")")]
pub struct UnknownBuild(pub String);

impl FromStr for ReleaseBuild {
    type Err = UnknownBuild;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alpha" => Ok(ReleaseBuild::Alpha),
            "demo" => Ok(ReleaseBuild::Demo),
            "expansion" => Ok(ReleaseBuild::Expansion),
            "headless" => Ok(ReleaseBuild::Headless),
            other => Err(UnknownBuild(other.to_string())),
        }
    }
}
