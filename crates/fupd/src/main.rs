//! fupd - Automated updater for headless Factorio installations.
//!
//! Probes the installed executable, compares it against the latest release
//! of the configured channel, and applies the atomic update packages the
//! update service publishes until the installation is current.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use fupd::config::RunConfig;
use fupd::game::InstalledGame;
use fupd::remote::HttpReleaseApi;
use fupd::runner::Updater;
use fupd::selftest;
use fupd_common::{FactorioPackage, ReleaseBuild, ReleaseChannel, ServiceCredentials};

#[derive(Parser)]
#[command(name = "fupd")]
#[command(about = "Automated updater for headless Factorio installations", long_about = None)]
#[command(version)]
struct Cli {
    /// Installation root; must end with a path separator and contain
    /// bin/x64/factorio
    #[arg(short, long, required_unless_present = "test")]
    rootdir: Option<String>,

    /// Release channel to follow: stable or experimental
    #[arg(short, long, default_value = "stable")]
    stable: ReleaseChannel,

    /// Package identity of this installation
    #[arg(long, default_value = "core-linux_headless64")]
    package: FactorioPackage,

    /// Build tag of this installation: alpha, demo, expansion or headless
    #[arg(long, default_value = "headless")]
    build: ReleaseBuild,

    /// Report whether an update exists, but install nothing
    #[arg(short, long)]
    no_install: bool,

    /// Log errors only
    #[arg(short, long)]
    quiet: bool,

    /// Run the built-in self-test against canned documents and exit
    #[arg(short, long)]
    test: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool) {
    let default_directive = if quiet { "error" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if cli.test {
        return selftest::run().await;
    }

    // clap enforces --rootdir whenever --test is absent.
    let rootdir = cli.rootdir.as_deref().context("--rootdir is required")?;

    let credentials =
        ServiceCredentials::from_env().context("reading the service credentials")?;
    let config = RunConfig::new(cli.stable, cli.build, cli.package, rootdir, cli.no_install)
        .context("checking the installation root")?;

    let api = HttpReleaseApi::new().context("building the HTTP client")?;
    let game = InstalledGame::new(config.executable());

    let updater = Updater::new(&config, &credentials, &api, &game);
    updater.run().await?;
    Ok(())
}
