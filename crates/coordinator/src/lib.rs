//! HTTP client for the coordinator registry.
//!
//! The coordinator is the sole source of truth for which CID is current for
//! an artifact hash; this node never caches mappings locally. Three
//! operations exist: lookup, register, invalidate.
//!
//! Transport policy: certificate verification is disabled (the trust
//! boundary is the private deployment network, not public CAs), each call
//! has a single 60 second total timeout, and connections are not pooled
//! across calls.

pub mod error;

pub use error::{CoordinatorError, CoordinatorResult};

use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use silo_core::config::CoordinatorConfig;
use silo_core::hash::{ArtifactHash, Cid};
use std::time::Duration;

/// Total per-call timeout; there are no separate connect/read phases.
const CALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct LookupResponse {
    cid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    success: bool,
}

/// Client for the coordinator's hash registry.
#[derive(Clone, Debug)]
pub struct CoordinatorClient {
    http: reqwest::Client,
    base_url: Url,
    host: String,
}

impl CoordinatorClient {
    /// Create a client from configuration.
    pub fn new(config: &CoordinatorConfig) -> CoordinatorResult<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| CoordinatorError::InvalidUrl(format!("{}: {e}", config.url)))?;
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(CALL_TIMEOUT)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            http,
            base_url,
            host: config.host.clone(),
        })
    }

    /// `api/host/{host}/hash/{hash}` with each parameter as one
    /// percent-encoded path segment.
    fn mapping_url(&self, hash: &ArtifactHash) -> CoordinatorResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CoordinatorError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "host", self.host.as_str(), "hash", hash.as_str()]);
        Ok(url)
    }

    /// `api/host/{host}/hash/{hash}/cid/{cid}`.
    fn registration_url(&self, hash: &ArtifactHash, cid: &Cid) -> CoordinatorResult<Url> {
        let mut url = self.mapping_url(hash)?;
        url.path_segments_mut()
            .map_err(|_| CoordinatorError::InvalidUrl(self.base_url.to_string()))?
            .extend(["cid", cid.as_str()]);
        Ok(url)
    }

    /// Send a request and read the body of a 2xx response, turning any
    /// other status into a fault.
    async fn send_checked(&self, method: Method, url: Url) -> CoordinatorResult<String> {
        let response = self.http.request(method, url).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(CoordinatorError::Status { status, body });
        }
        Ok(body)
    }

    fn parse<T: serde::de::DeserializeOwned>(body: &str) -> CoordinatorResult<T> {
        serde_json::from_str(body)
            .map_err(|e| CoordinatorError::Protocol(format!("unexpected body {body:?}: {e}")))
    }

    /// Look up the current CID for a hash.
    ///
    /// A 404 status and a 2xx body with a null/absent `cid` both mean "no
    /// mapping" and return `None`; any other non-2xx is a transport fault.
    pub async fn lookup(&self, hash: &ArtifactHash) -> CoordinatorResult<Option<Cid>> {
        let url = self.mapping_url(hash)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(CoordinatorError::Status { status, body });
        }

        let parsed: LookupResponse = Self::parse(&body)?;
        match parsed.cid {
            None => Ok(None),
            Some(raw) => {
                let cid = Cid::parse(&raw)
                    .map_err(|e| CoordinatorError::Protocol(e.to_string()))?;
                Ok(Some(cid))
            }
        }
    }

    /// Register `cid` as the current mapping for `hash`.
    pub async fn register(&self, hash: &ArtifactHash, cid: &Cid) -> CoordinatorResult<bool> {
        let url = self.registration_url(hash, cid)?;
        let body = self.send_checked(Method::POST, url).await?;
        let parsed: AckResponse = Self::parse(&body)?;
        Ok(parsed.success)
    }

    /// Remove the mapping for `hash`.
    pub async fn invalidate(&self, hash: &ArtifactHash) -> CoordinatorResult<bool> {
        let url = self.mapping_url(hash)?;
        let body = self.send_checked(Method::DELETE, url).await?;
        let parsed: AckResponse = Self::parse(&body)?;
        Ok(parsed.success)
    }
}
