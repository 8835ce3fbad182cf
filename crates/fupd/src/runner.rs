//! One update run end to end: probe, compare, resolve, pipeline, verify.

use thiserror::Error;
use tracing::info;

use fupd_common::feed::{self, FeedError};
use fupd_common::local::{self, LocalInstall, ProbeError};
use fupd_common::sequence::{self, EdgeListError, ResolveError};
use fupd_common::{FactorioVersion, ServiceCredentials};

use crate::config::RunConfig;
use crate::game::{GameError, GameExecutable};
use crate::pipeline::{PipelineError, UpdatePipeline};
use crate::remote::{ReleaseApi, RemoteError};

/// Successful terminal states of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The installation already matches the latest release.
    UpToDate { version: FactorioVersion },
    /// An update exists but installing was not requested.
    NoInstallRequested {
        local: FactorioVersion,
        latest: FactorioVersion,
    },
    /// The installation was advanced to the latest release.
    Updated {
        from: FactorioVersion,
        to: FactorioVersion,
        steps: usize,
    },
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("could not query the installed version: {0}")]
    Exec(#[from] GameError),
    #[error("local version probe failed: {0}")]
    Probe(#[from] ProbeError),
    #[error("remote request failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("release feed is malformed: {0}")]
    Feed(#[from] FeedError),
    #[error("available-updates document is malformed: {0}")]
    EdgeList(#[from] EdgeListError),
    #[error("no usable update sequence: {0}")]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// Every package applied cleanly, yet the executable does not report
    /// the target version. The installation needs a manual look.
    #[error("executable reports {actual} after updating, expected {expected}")]
    PostconditionMismatch {
        expected: FactorioVersion,
        actual: FactorioVersion,
    },
}

/// Orchestrates one update run against the two collaborator seams.
pub struct Updater<'a> {
    config: &'a RunConfig,
    credentials: &'a ServiceCredentials,
    api: &'a dyn ReleaseApi,
    game: &'a dyn GameExecutable,
}

impl<'a> Updater<'a> {
    pub fn new(
        config: &'a RunConfig,
        credentials: &'a ServiceCredentials,
        api: &'a dyn ReleaseApi,
        game: &'a dyn GameExecutable,
    ) -> Self {
        Self {
            config,
            credentials,
            api,
            game,
        }
    }

    /// Run the whole update state machine once.
    pub async fn run(&self) -> Result<RunOutcome, UpdateError> {
        let local = self.probe_local().await?;
        info!("local version is {}", local.version);

        let latest = self.latest_release().await?;
        info!("latest {} version is {}", self.config.channel, latest);

        if local.version == latest {
            info!("local version is the latest one, nothing to do");
            return Ok(RunOutcome::UpToDate { version: latest });
        }

        if self.config.no_install {
            info!("an update to {latest} exists, but installing was not requested");
            return Ok(RunOutcome::NoInstallRequested {
                local: local.version,
                latest,
            });
        }

        info!("updating {} -> {}", local.version, latest);
        let available = self.api.available_updates().await?;
        let edges = sequence::package_updates(&available, self.config.package)?;
        let chain = sequence::resolve(&edges, local.version, latest)?;
        info!("update sequence has {} step(s)", chain.len());

        let mut pipeline = UpdatePipeline::new(
            self.api,
            self.game,
            self.credentials,
            self.config.package,
            &self.config.rootdir,
        );
        let applied = pipeline.apply_sequence(&chain).await;
        pipeline.cleanup();
        applied?;

        let reprobed = self.probe_local().await?;
        if reprobed.version != latest {
            return Err(UpdateError::PostconditionMismatch {
                expected: latest,
                actual: reprobed.version,
            });
        }

        info!("all good, the installation now runs {latest}");
        Ok(RunOutcome::Updated {
            from: local.version,
            to: latest,
            steps: chain.len(),
        })
    }

    async fn probe_local(&self) -> Result<LocalInstall, UpdateError> {
        let banner = self.game.version_banner().await?;
        let install = local::parse_version_banner(
            &banner,
            self.config.platform_tag(),
            self.config.build.as_str(),
        )?;
        Ok(install)
    }

    async fn latest_release(&self) -> Result<FactorioVersion, UpdateError> {
        let doc = self.api.latest_releases().await?;
        Ok(feed::latest_release(&doc, self.config.channel, self.config.build)?)
    }
}
