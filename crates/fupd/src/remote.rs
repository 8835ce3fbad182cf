//! The remote side of the update flow.
//!
//! [`ReleaseApi`] is the seam between the updater and the update service.
//! The production implementation talks HTTP with bounded timeouts; the fake
//! serves canned documents for the self-test and the integration tests and
//! counts its calls so tests can assert which stages ran.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use fupd_common::{FactorioPackage, FactorioVersion, ServiceCredentials, UpdateEdge};

/// Latest release per channel and build tag.
pub const LATEST_RELEASES_URL: &str = "https://factorio.com/api/latest-releases";
/// Atomic upgrade edges per package.
pub const AVAILABLE_UPDATES_URL: &str = "https://updater.factorio.com/get-available-versions";
/// Link resolution endpoint; the query string carries the credentials.
pub const DOWNLOAD_LINK_URL: &str = "https://updater.factorio.com/get-download-link";
/// Resolved links must start with this prefix to be fetched.
pub const TRUSTED_DOWNLOAD_PREFIX: &str = "https://dl.factorio.com/";

const API_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} answered with status {status}")]
    BadStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("{url} did not answer with JSON: {source}")]
    NotJson {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned an empty payload")]
    EmptyPayload { url: String },
}

fn classify(url: &str, source: reqwest::Error) -> RemoteError {
    if source.is_timeout() {
        RemoteError::Timeout {
            url: url.to_string(),
        }
    } else {
        // reqwest renders the full request URL, query string included.
        RemoteError::Request {
            url: url.to_string(),
            source: source.without_url(),
        }
    }
}

/// Remote collaborator of the update flow.
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    /// Fetch the latest-releases document.
    async fn latest_releases(&self) -> Result<Value, RemoteError>;

    /// Fetch the available-updates document.
    async fn available_updates(&self) -> Result<Value, RemoteError>;

    /// Resolve the link-response document for one edge.
    async fn update_link_response(
        &self,
        credentials: &ServiceCredentials,
        package: FactorioPackage,
        edge: &UpdateEdge,
    ) -> Result<Value, RemoteError>;

    /// Download the payload behind a resolved link.
    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteError>;

    /// Prefix a resolved link must carry to be fetched at all.
    fn trusted_download_prefix(&self) -> &str;
}

/// Production implementation backed by the public update service.
pub struct HttpReleaseApi {
    client: reqwest::Client,
}

impl HttpReleaseApi {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fupd/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// `url` is fetched, `shown` is what errors and logs mention. They
    /// differ only for the link endpoint, whose query string holds the
    /// token.
    async fn fetch_json(&self, url: &str, shown: &str) -> Result<Value, RemoteError> {
        debug!("GET {}", shown);
        let response = self
            .client
            .get(url)
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|e| classify(shown, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::BadStatus {
                url: shown.to_string(),
                status,
            });
        }
        response.json().await.map_err(|e| RemoteError::NotJson {
            url: shown.to_string(),
            source: e.without_url(),
        })
    }
}

#[async_trait]
impl ReleaseApi for HttpReleaseApi {
    async fn latest_releases(&self) -> Result<Value, RemoteError> {
        self.fetch_json(LATEST_RELEASES_URL, LATEST_RELEASES_URL).await
    }

    async fn available_updates(&self) -> Result<Value, RemoteError> {
        self.fetch_json(AVAILABLE_UPDATES_URL, AVAILABLE_UPDATES_URL).await
    }

    async fn update_link_response(
        &self,
        credentials: &ServiceCredentials,
        package: FactorioPackage,
        edge: &UpdateEdge,
    ) -> Result<Value, RemoteError> {
        // All query values are pre-validated and URL-safe.
        let url = format!(
            "{DOWNLOAD_LINK_URL}?username={}&token={}&package={}&from={}&to={}",
            credentials.username(),
            credentials.token(),
            package,
            edge.from,
            edge.to,
        );
        self.fetch_json(&url, DOWNLOAD_LINK_URL).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| classify(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::BadStatus {
                url: url.to_string(),
                status,
            });
        }
        let payload = response.bytes().await.map_err(|e| classify(url, e))?;
        if payload.is_empty() {
            return Err(RemoteError::EmptyPayload {
                url: url.to_string(),
            });
        }
        Ok(payload.to_vec())
    }

    fn trusted_download_prefix(&self) -> &str {
        TRUSTED_DOWNLOAD_PREFIX
    }
}

/// Canned implementation used by the self-test and the integration tests.
///
/// Link resolution answers `["fake:<to>"]` and downloading `fake:<version>`
/// yields the version banner a freshly patched executable would print, so a
/// fake executable can "apply" the payload by adopting it as its banner.
pub struct FakeReleaseApi {
    latest: Value,
    available: Value,
    link_override: Option<Value>,
    fail_downloads: bool,
    latest_calls: AtomicUsize,
    available_calls: AtomicUsize,
    link_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl FakeReleaseApi {
    pub fn new(latest: Value, available: Value) -> Self {
        Self {
            latest,
            available,
            link_override: None,
            fail_downloads: false,
            latest_calls: AtomicUsize::new(0),
            available_calls: AtomicUsize::new(0),
            link_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    /// Serve this document for every link resolution instead of the
    /// default `["fake:<to>"]`.
    pub fn with_link_response(mut self, response: Value) -> Self {
        self.link_override = Some(response);
        self
    }

    /// Make every payload download fail.
    pub fn failing_downloads(mut self) -> Self {
        self.fail_downloads = true;
        self
    }

    pub fn latest_call_count(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub fn available_call_count(&self) -> usize {
        self.available_calls.load(Ordering::SeqCst)
    }

    pub fn link_call_count(&self) -> usize {
        self.link_calls.load(Ordering::SeqCst)
    }

    pub fn download_call_count(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseApi for FakeReleaseApi {
    async fn latest_releases(&self) -> Result<Value, RemoteError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.latest.clone())
    }

    async fn available_updates(&self) -> Result<Value, RemoteError> {
        self.available_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.available.clone())
    }

    async fn update_link_response(
        &self,
        _credentials: &ServiceCredentials,
        _package: FactorioPackage,
        edge: &UpdateEdge,
    ) -> Result<Value, RemoteError> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        match &self.link_override {
            Some(response) => Ok(response.clone()),
            None => Ok(serde_json::json!([format!("fake:{}", edge.to)])),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads {
            return Err(RemoteError::EmptyPayload {
                url: url.to_string(),
            });
        }
        let version = url
            .strip_prefix("fake:")
            .and_then(|raw| raw.parse::<FactorioVersion>().ok())
            .ok_or_else(|| RemoteError::EmptyPayload {
                url: url.to_string(),
            })?;
        Ok(crate::game::sample_banner(version).into_bytes())
    }

    fn trusted_download_prefix(&self) -> &str {
        "fake:"
    }
}
