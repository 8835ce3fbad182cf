//! Run configuration and installation root validation.
//!
//! The rootdir is validated before anything else happens, network included:
//! the raw argument must end with a path separator, name an existing
//! readable and writable directory and contain an executable game binary.
//! Everything one run needs is then carried in a [`RunConfig`] and threaded
//! through explicitly.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use thiserror::Error;

use fupd_common::{FactorioPackage, ReleaseBuild, ReleaseChannel};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("rootdir \"{0}\" does not end with a path separator")]
    NoTrailingSeparator(String),
    #[error("rootdir \"{}\" does not exist", .0.display())]
    Missing(PathBuf),
    #[error("rootdir \"{}\" is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("rootdir \"{}\" is not readable", .0.display())]
    NotReadable(PathBuf),
    #[error("rootdir \"{}\" is not writable", .0.display())]
    NotWritable(PathBuf),
    #[error("executable \"{}\" does not exist", .0.display())]
    ExecutableMissing(PathBuf),
    #[error("\"{}\" is not executable", .0.display())]
    NotExecutable(PathBuf),
}

/// Everything one update run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub channel: ReleaseChannel,
    pub build: ReleaseBuild,
    pub package: FactorioPackage,
    pub rootdir: PathBuf,
    pub no_install: bool,
}

impl RunConfig {
    /// Validate the raw `--rootdir` argument and assemble the configuration.
    pub fn new(
        channel: ReleaseChannel,
        build: ReleaseBuild,
        package: FactorioPackage,
        rootdir: &str,
        no_install: bool,
    ) -> Result<Self, ConfigError> {
        validate_rootdir(rootdir)?;
        Ok(Self {
            channel,
            build,
            package,
            rootdir: PathBuf::from(rootdir),
            no_install,
        })
    }

    /// Path of the installed executable.
    pub fn executable(&self) -> PathBuf {
        executable_path(&self.rootdir)
    }

    /// Platform tag the local version banner must report.
    pub fn platform_tag(&self) -> &'static str {
        self.package.platform_tag()
    }
}

/// Path of the game executable below an installation root.
pub fn executable_path(root: &Path) -> PathBuf {
    root.join("bin").join("x64").join("factorio")
}

fn validate_rootdir(raw: &str) -> Result<(), ConfigError> {
    if !raw.ends_with(MAIN_SEPARATOR) {
        return Err(ConfigError::NoTrailingSeparator(raw.to_string()));
    }
    let root = Path::new(raw);
    if !root.exists() {
        return Err(ConfigError::Missing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ConfigError::NotADirectory(root.to_path_buf()));
    }
    ensure_accessible(root)?;
    let executable = executable_path(root);
    if !executable.is_file() {
        return Err(ConfigError::ExecutableMissing(executable));
    }
    ensure_executable(&executable)
}

// Staged packages land directly in the rootdir, so it has to be writable
// before any network round trip starts.
#[cfg(unix)]
fn ensure_accessible(root: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(root)
        .map_err(|_| ConfigError::Missing(root.to_path_buf()))?;
    let mode = metadata.permissions().mode();
    if mode & 0o444 == 0 {
        return Err(ConfigError::NotReadable(root.to_path_buf()));
    }
    if mode & 0o222 == 0 {
        return Err(ConfigError::NotWritable(root.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_accessible(_root: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|_| ConfigError::ExecutableMissing(path.to_path_buf()))?;
    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(ConfigError::NotExecutable(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
