//! Update package identities.
//!
//! A package names the platform, architecture and edition of the files an
//! atomic upgrade patches, e.g. `core-linux_headless64`. The set is closed;
//! a name outside it is a configuration mistake, not data.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactorioPackage {
    CoreLinux32,
    CoreLinux64,
    CoreLinuxHeadless64,
    CoreMac,
    CoreMacArm64,
    CoreMacX64,
    CoreWin32,
    CoreWin64,
    CoreExpansionLinux64,
    CoreExpansionMac,
    CoreExpansionWin64,
}

impl FactorioPackage {
    pub const ALL: [FactorioPackage; 11] = [
        FactorioPackage::CoreLinux32,
        FactorioPackage::CoreLinux64,
        FactorioPackage::CoreLinuxHeadless64,
        FactorioPackage::CoreMac,
        FactorioPackage::CoreMacArm64,
        FactorioPackage::CoreMacX64,
        FactorioPackage::CoreWin32,
        FactorioPackage::CoreWin64,
        FactorioPackage::CoreExpansionLinux64,
        FactorioPackage::CoreExpansionMac,
        FactorioPackage::CoreExpansionWin64,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FactorioPackage::CoreLinux32 => "core-linux32",
            FactorioPackage::CoreLinux64 => "core-linux64",
            FactorioPackage::CoreLinuxHeadless64 => "core-linux_headless64",
            FactorioPackage::CoreMac => "core-mac",
            FactorioPackage::CoreMacArm64 => "core-mac-arm64",
            FactorioPackage::CoreMacX64 => "core-mac-x64",
            FactorioPackage::CoreWin32 => "core-win32",
            FactorioPackage::CoreWin64 => "core-win64",
            FactorioPackage::CoreExpansionLinux64 => "core_expansion-linux64",
            FactorioPackage::CoreExpansionMac => "core_expansion-mac",
            FactorioPackage::CoreExpansionWin64 => "core_expansion-win64",
        }
    }

    /// Platform tag the executable for this package reports in its
    /// `--version` banner.
    pub fn platform_tag(self) -> &'static str {
        match self {
            FactorioPackage::CoreLinux32 => "linux32",
            FactorioPackage::CoreLinux64
            | FactorioPackage::CoreLinuxHeadless64
            | FactorioPackage::CoreExpansionLinux64 => "linux64",
            FactorioPackage::CoreMac
            | FactorioPackage::CoreMacX64
            | FactorioPackage::CoreExpansionMac => "mac",
            FactorioPackage::CoreMacArm64 => "mac-arm64",
            FactorioPackage::CoreWin32 => "win32",
            FactorioPackage::CoreWin64 | FactorioPackage::CoreExpansionWin64 => "win64",
        }
    }
}

impl fmt::Display for FactorioPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown package \"{0}\"")]
pub struct UnknownPackage(pub String);

impl FromStr for FactorioPackage {
    type Err = UnknownPackage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FactorioPackage::ALL
            .into_iter()
            .find(|package| package.as_str() == s)
            .ok_or_else(|| UnknownPackage(s.to_string()))
    }
}
