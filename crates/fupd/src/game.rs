//! The local side of the update flow: the installed game executable.
//!
//! [`GameExecutable`] is the seam around the binary on disk. The production
//! implementation shells out with bounded timeouts; [`FakeGame`] emulates an
//! installation whose banner advances when an update is applied, which is
//! what the self-test and the integration tests drive the pipeline against.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use fupd_common::FactorioVersion;

const VERSION_TIMEOUT: Duration = Duration::from_secs(30);
const APPLY_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum GameError {
    #[error("failed to run \"{}\": {source}", .executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("\"{}\" did not finish within {timeout:?}", .executable.display())]
    Timeout {
        executable: PathBuf,
        timeout: Duration,
    },
}

/// Result of one `--apply-update` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub exit_code: i32,
    pub output: String,
}

impl ApplyOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Local collaborator of the update flow.
#[async_trait]
pub trait GameExecutable: Send + Sync {
    /// Run the version self-report and return its raw output.
    async fn version_banner(&self) -> Result<String, GameError>;

    /// Apply one downloaded update package.
    ///
    /// A non-zero exit code is a normal [`ApplyOutcome`], not an `Err`; the
    /// error type covers not being able to run the executable at all.
    async fn apply_update(&self, package_file: &Path) -> Result<ApplyOutcome, GameError>;
}

/// Production implementation that shells out to the installed binary.
pub struct InstalledGame {
    executable: PathBuf,
}

impl InstalledGame {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    async fn run(
        &self,
        command: &mut tokio::process::Command,
        timeout: Duration,
    ) -> Result<Output, GameError> {
        match tokio::time::timeout(timeout, command.output()).await {
            Ok(result) => result.map_err(|source| GameError::Spawn {
                executable: self.executable.clone(),
                source,
            }),
            Err(_) => Err(GameError::Timeout {
                executable: self.executable.clone(),
                timeout,
            }),
        }
    }
}

#[async_trait]
impl GameExecutable for InstalledGame {
    async fn version_banner(&self) -> Result<String, GameError> {
        debug!("running \"{}\" --version", self.executable.display());
        let mut command = tokio::process::Command::new(&self.executable);
        command.arg("--version").kill_on_drop(true);
        let output = self.run(&mut command, VERSION_TIMEOUT).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn apply_update(&self, package_file: &Path) -> Result<ApplyOutcome, GameError> {
        debug!(
            "running \"{}\" --apply-update {}",
            self.executable.display(),
            package_file.display()
        );
        let mut command = tokio::process::Command::new(&self.executable);
        command
            .arg("--apply-update")
            .arg(package_file)
            .kill_on_drop(true);
        let output = self.run(&mut command, APPLY_TIMEOUT).await?;

        let mut text = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr.trim_end());
        }
        Ok(ApplyOutcome {
            // A signal death carries no exit code.
            exit_code: output.status.code().unwrap_or(-1),
            output: text,
        })
    }
}

/// Version banner a freshly installed linux64 headless executable prints.
pub fn sample_banner(version: FactorioVersion) -> String {
    format!(
        "Version: {version} (build 1, linux64, headless)\n\
         Version: 64\n\
         Map input version: 1.0.0-0\n\
         Map output version: 1.0.0-0"
    )
}

/// In-memory executable emulation.
///
/// Applying an update replaces the banner with the content of the applied
/// file, so a chain of applies walks the reported version forward the way a
/// real patched installation would.
pub struct FakeGame {
    banner: Mutex<String>,
    apply_failure: Option<ApplyOutcome>,
    ignore_applies: bool,
    version_calls: AtomicUsize,
    apply_calls: AtomicUsize,
}

impl FakeGame {
    pub fn at_version(version: FactorioVersion) -> Self {
        Self::with_banner(sample_banner(version))
    }

    pub fn with_banner(banner: String) -> Self {
        Self {
            banner: Mutex::new(banner),
            apply_failure: None,
            ignore_applies: false,
            version_calls: AtomicUsize::new(0),
            apply_calls: AtomicUsize::new(0),
        }
    }

    /// Make every apply fail with the given exit code and output.
    pub fn failing_applies(mut self, exit_code: i32, output: &str) -> Self {
        self.apply_failure = Some(ApplyOutcome {
            exit_code,
            output: output.to_string(),
        });
        self
    }

    /// Make every apply report success without advancing the banner.
    pub fn ignoring_applies(mut self) -> Self {
        self.ignore_applies = true;
        self
    }

    pub fn version_call_count(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    pub fn apply_call_count(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameExecutable for FakeGame {
    async fn version_banner(&self) -> Result<String, GameError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.banner.lock().unwrap().clone())
    }

    async fn apply_update(&self, package_file: &Path) -> Result<ApplyOutcome, GameError> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.apply_failure {
            return Ok(failure.clone());
        }
        let payload =
            std::fs::read_to_string(package_file).map_err(|source| GameError::Spawn {
                executable: package_file.to_path_buf(),
                source,
            })?;
        if !self.ignore_applies {
            *self.banner.lock().unwrap() = payload;
        }
        Ok(ApplyOutcome {
            exit_code: 0,
            output: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fupd_common::local::parse_version_banner;

    #[test]
    fn sample_banner_parses_back() {
        let banner = sample_banner(FactorioVersion::new(1, 1, 0));
        let install = parse_version_banner(&banner, "linux64", "headless").unwrap();
        assert_eq!(install.version, FactorioVersion::new(1, 1, 0));
        assert_eq!(install.build_tag, "headless");
    }

    #[tokio::test]
    async fn fake_game_adopts_the_applied_payload() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("upd_1.0.0_1.0.1.zip");
        std::fs::write(&package, sample_banner(FactorioVersion::new(1, 0, 1))).unwrap();

        let game = FakeGame::at_version(FactorioVersion::new(1, 0, 0));
        let outcome = game.apply_update(&package).await.unwrap();
        assert!(outcome.success());

        let banner = game.version_banner().await.unwrap();
        let install = parse_version_banner(&banner, "linux64", "headless").unwrap();
        assert_eq!(install.version, FactorioVersion::new(1, 0, 1));
        assert_eq!(game.apply_call_count(), 1);
        assert_eq!(game.version_call_count(), 1);
    }

    #[tokio::test]
    async fn failing_fake_reports_its_outcome_without_applying() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("upd_1.0.0_1.0.1.zip");
        std::fs::write(&package, "payload").unwrap();

        let game =
            FakeGame::at_version(FactorioVersion::new(1, 0, 0)).failing_applies(7, "bad archive");
        let outcome = game.apply_update(&package).await.unwrap();
        assert_eq!(outcome.exit_code, 7);
        assert_eq!(outcome.output, "bad archive");

        let banner = game.version_banner().await.unwrap();
        assert!(banner.contains("1.0.0"));
    }
}
