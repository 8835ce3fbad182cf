//! The update pipeline: resolve, download, persist and apply each edge of a
//! sequence, then clean up the staged packages.
//!
//! Every edge goes through the same stages and the first failure stops the
//! run. Downloaded packages are staged as `upd_<from>_<to>.zip` directly in
//! the installation root, which is where the executable expects to pick
//! them up from.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use fupd_common::link::{self, LinkError};
use fupd_common::{FactorioPackage, ServiceCredentials, UpdateEdge};

use crate::game::{GameError, GameExecutable};
use crate::remote::{ReleaseApi, RemoteError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("link resolution for {edge} failed: {source}")]
    LinkResolution {
        edge: UpdateEdge,
        #[source]
        source: RemoteError,
    },
    #[error("link response for {edge} is malformed: {source}")]
    MalformedLinkResponse {
        edge: UpdateEdge,
        #[source]
        source: LinkError,
    },
    #[error("download link \"{link}\" for {edge} is not under the trusted prefix \"{prefix}\"")]
    UntrustedLink {
        edge: UpdateEdge,
        link: String,
        prefix: String,
    },
    #[error("download for {edge} failed: {source}")]
    Download {
        edge: UpdateEdge,
        #[source]
        source: RemoteError,
    },
    #[error("could not persist update package \"{}\": {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("applying \"{}\" failed with exit code {exit_code}:\n{output}", .path.display())]
    Apply {
        path: PathBuf,
        exit_code: i32,
        output: String,
    },
    #[error("could not invoke the executable: {0}")]
    Invoke(#[from] GameError),
}

/// Drives a resolved update sequence, one edge at a time, and remembers the
/// staged package files until [`UpdatePipeline::cleanup`] is called.
pub struct UpdatePipeline<'a> {
    api: &'a dyn ReleaseApi,
    game: &'a dyn GameExecutable,
    credentials: &'a ServiceCredentials,
    package: FactorioPackage,
    root: &'a Path,
    staged: Vec<PathBuf>,
}

impl<'a> UpdatePipeline<'a> {
    pub fn new(
        api: &'a dyn ReleaseApi,
        game: &'a dyn GameExecutable,
        credentials: &'a ServiceCredentials,
        package: FactorioPackage,
        root: &'a Path,
    ) -> Self {
        Self {
            api,
            game,
            credentials,
            package,
            root,
            staged: Vec::new(),
        }
    }

    /// Apply every edge in order, stopping at the first failure.
    pub async fn apply_sequence(&mut self, sequence: &[UpdateEdge]) -> Result<(), PipelineError> {
        for edge in sequence {
            self.apply_edge(*edge).await?;
        }
        Ok(())
    }

    async fn apply_edge(&mut self, edge: UpdateEdge) -> Result<(), PipelineError> {
        info!("resolving download link for {edge}");
        let response = self
            .api
            .update_link_response(self.credentials, self.package, &edge)
            .await
            .map_err(|source| PipelineError::LinkResolution { edge, source })?;
        let link = link::first_download_link(&response)
            .map_err(|source| PipelineError::MalformedLinkResponse { edge, source })?;

        let prefix = self.api.trusted_download_prefix();
        if !link.starts_with(prefix) {
            return Err(PipelineError::UntrustedLink {
                edge,
                link,
                prefix: prefix.to_string(),
            });
        }

        info!("downloading update package for {edge}");
        let payload = self
            .api
            .download(&link)
            .await
            .map_err(|source| PipelineError::Download { edge, source })?;

        let path = self.staging_path(edge);
        std::fs::write(&path, &payload).map_err(|source| PipelineError::Persist {
            path: path.clone(),
            source,
        })?;
        if !path.is_file() {
            return Err(PipelineError::Persist {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing after write"),
            });
        }
        self.staged.push(path.clone());

        info!("applying update package \"{}\"", path.display());
        let outcome = self.game.apply_update(&path).await?;
        if !outcome.success() {
            return Err(PipelineError::Apply {
                path,
                exit_code: outcome.exit_code,
                output: outcome.output,
            });
        }
        Ok(())
    }

    /// Best-effort removal of every staged package. Runs whether or not the
    /// sequence succeeded and never overrides the primary result.
    pub fn cleanup(&mut self) {
        let staged = std::mem::take(&mut self.staged);
        remove_staged_files(self.root, &staged);
    }

    fn staging_path(&self, edge: UpdateEdge) -> PathBuf {
        self.root.join(format!("upd_{}_{}.zip", edge.from, edge.to))
    }
}

/// Delete staged package files. Paths that do not lie inside `root` are
/// logged and left alone, whatever put them on the list.
pub fn remove_staged_files(root: &Path, staged: &[PathBuf]) {
    for path in staged {
        if !path.starts_with(root) {
            warn!(
                "not deleting \"{}\": outside the installation root \"{}\"",
                path.display(),
                root.display()
            );
            continue;
        }
        info!("deleting temporary file \"{}\"", path.display());
        if let Err(err) = std::fs::remove_file(path) {
            warn!("could not delete \"{}\": {err}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn staged_files_inside_the_root_are_removed() {
        let root = TempDir::new().unwrap();
        let staged = root.path().join("upd_1.0.0_1.0.1.zip");
        fs::write(&staged, "payload").unwrap();

        remove_staged_files(root.path(), &[staged.clone()]);
        assert!(!staged.exists());
    }

    #[test]
    fn paths_outside_the_root_are_left_alone() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let outside = elsewhere.path().join("upd_1.0.0_1.0.1.zip");
        fs::write(&outside, "payload").unwrap();

        remove_staged_files(root.path(), &[outside.clone()]);
        assert!(outside.exists());
    }

    #[test]
    fn missing_files_do_not_disturb_the_rest() {
        let root = TempDir::new().unwrap();
        let gone = root.path().join("upd_1.0.0_1.0.1.zip");
        let present = root.path().join("upd_1.0.1_1.1.0.zip");
        fs::write(&present, "payload").unwrap();

        remove_staged_files(root.path(), &[gone, present.clone()]);
        assert!(!present.exists());
    }
}
