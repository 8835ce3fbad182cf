//! Built-in self-test: the complete update flow for every channel against
//! canned collaborators.
//!
//! Stays as close to the production path as possible: a scratch installation
//! root on disk, the real pipeline (staged files included) and the real
//! orchestration. Only the network and the executable are fakes.

use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;

use fupd_common::{
    FactorioPackage, FactorioVersion, ReleaseBuild, ReleaseChannel, ServiceCredentials,
};

use crate::config::{executable_path, RunConfig};
use crate::game::FakeGame;
use crate::remote::FakeReleaseApi;
use crate::runner::{RunOutcome, Updater};

/// Latest-releases fixture: stable tops out at 1.1.0, experimental at 1.1.1.
fn latest_releases_fixture() -> serde_json::Value {
    json!({
        "stable": {
            "alpha": "1.1.0", "demo": "1.1.0", "expansion": "1.1.0", "headless": "1.1.0",
        },
        "experimental": {
            "alpha": "1.1.1", "demo": "1.1.1", "expansion": "1.1.1", "headless": "1.1.1",
        },
    })
}

/// Available-updates fixture, including the kind of non-edge entry the live
/// feed interleaves with the edges.
fn available_updates_fixture() -> serde_json::Value {
    json!({
        "core-linux_headless64": [
            {"from": "1.0.0", "to": "1.0.1"},
            {"from": "1.0.1", "to": "1.1.0"},
            {"from": "1.1.0", "to": "1.1.1"},
            {"stable": "1.1.0"},
        ],
    })
}

/// Run the self-test for both channels.
///
/// Exercises feed reading, banner parsing, sequence resolution, the pipeline
/// and the postcondition check without network access or a real
/// installation.
pub async fn run() -> Result<()> {
    let credentials = ServiceCredentials::new("selftest", "123456789012345678901234567890")
        .context("building self-test credentials")?;

    for channel in ReleaseChannel::ALL {
        info!("running the {channel} channel self-test");
        let target = match channel {
            ReleaseChannel::Stable => FactorioVersion::new(1, 1, 0),
            ReleaseChannel::Experimental => FactorioVersion::new(1, 1, 1),
        };

        let root = scratch_root(channel)?;
        let outcome = run_channel(channel, &credentials, &root).await;
        let _ = fs::remove_dir_all(&root);

        match outcome? {
            RunOutcome::Updated { from, to, steps } if to == target => {
                info!("self-test {channel}: updated {from} -> {to} in {steps} step(s)");
            }
            other => bail!("self-test {channel} ended in unexpected state {other:?}"),
        }
    }

    info!("all self-tests were successful");
    Ok(())
}

async fn run_channel(
    channel: ReleaseChannel,
    credentials: &ServiceCredentials,
    root: &Path,
) -> Result<RunOutcome> {
    let rootdir = format!("{}{}", root.display(), MAIN_SEPARATOR);
    let config = RunConfig::new(
        channel,
        ReleaseBuild::Headless,
        FactorioPackage::CoreLinuxHeadless64,
        &rootdir,
        false,
    )
    .context("validating the scratch root")?;

    let api = FakeReleaseApi::new(latest_releases_fixture(), available_updates_fixture());
    let game = FakeGame::at_version(FactorioVersion::new(1, 0, 0));

    let updater = Updater::new(&config, credentials, &api, &game);
    Ok(updater.run().await?)
}

/// Create a throwaway installation root that passes validation.
fn scratch_root(channel: ReleaseChannel) -> Result<PathBuf> {
    let root = std::env::temp_dir().join(format!(
        "fupd-selftest-{channel}-{}",
        std::process::id()
    ));
    let bin = root.join("bin").join("x64");
    fs::create_dir_all(&bin).with_context(|| format!("creating {}", bin.display()))?;

    let executable = executable_path(&root);
    fs::write(&executable, "#!/bin/sh\nexit 0\n")
        .with_context(|| format!("creating {}", executable.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&executable, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("marking {} executable", executable.display()))?;
    }
    Ok(root)
}
