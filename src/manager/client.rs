//! reqwest-backed implementation of [`Probe`] and [`Forwarder`].

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::user_agent;

use super::{
    ADD_DOWNLOAD_PATH, DownloadRequest, Forwarder, ManagerConfig, ManagerError, ManagerStatus,
    PING_PATH, Probe,
};

/// HTTP client for the local download manager.
///
/// Every probe and forward is an independent request; nothing about the
/// manager's availability is remembered between calls.
#[derive(Debug, Clone)]
pub struct ManagerClient {
    client: Client,
    ping_url: Url,
    add_download_url: Url,
}

impl ManagerClient {
    /// Creates a client for the manager described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::ClientBuild`] if the HTTP client cannot be
    /// constructed, or [`ManagerError::InvalidEndpoint`] if the endpoint URLs
    /// cannot be formed.
    pub fn new(config: &ManagerConfig) -> Result<Self, ManagerError> {
        let base_url = config.base_url();
        let base = Url::parse(&base_url).map_err(|e| ManagerError::invalid_endpoint(&base_url, e))?;
        let ping_url = base
            .join(PING_PATH)
            .map_err(|e| ManagerError::invalid_endpoint(PING_PATH, e))?;
        let add_download_url = base
            .join(ADD_DOWNLOAD_PATH)
            .map_err(|e| ManagerError::invalid_endpoint(ADD_DOWNLOAD_PATH, e))?;

        // Loopback traffic must never be routed through a system proxy, and
        // the manager may be a minimal server that mishandles keep-alive.
        let client = Client::builder()
            .user_agent(user_agent::default_manager_user_agent())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .no_proxy()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|source| ManagerError::ClientBuild { source })?;

        debug!(base = %base, "manager client ready");
        Ok(Self {
            client,
            ping_url,
            add_download_url,
        })
    }

    /// Issues `GET /ping`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError`] for transport failures and non-2xx statuses.
    #[instrument(skip(self), fields(endpoint = %self.ping_url))]
    pub async fn ping(&self) -> Result<(), ManagerError> {
        let response = self
            .client
            .get(self.ping_url.clone())
            .send()
            .await
            .map_err(|e| ManagerError::from_request(self.ping_url.as_str(), e))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "manager answered ping");
            Ok(())
        } else {
            Err(ManagerError::rejected(self.ping_url.as_str(), status.as_u16()))
        }
    }

    /// Issues `POST /add_download` with the request as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError`] for transport failures and non-2xx statuses.
    #[instrument(skip(self, request), fields(url = %request.url, filename = %request.filename))]
    pub async fn try_forward(&self, request: &DownloadRequest) -> Result<(), ManagerError> {
        let response = self
            .client
            .post(self.add_download_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| ManagerError::from_request(self.add_download_url.as_str(), e))?;

        let status = response.status();
        if status.is_success() {
            info!(status = status.as_u16(), "download handed off to manager");
            Ok(())
        } else {
            Err(ManagerError::rejected(
                self.add_download_url.as_str(),
                status.as_u16(),
            ))
        }
    }

    /// Probes the manager and maps the result to a display status.
    pub async fn status(&self) -> ManagerStatus {
        ManagerStatus::from_reachable(self.is_reachable().await)
    }
}

#[async_trait]
impl Probe for ManagerClient {
    async fn is_reachable(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(error) => {
                debug!(error = %error, "manager probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl Forwarder for ManagerClient {
    async fn forward(&self, request: &DownloadRequest) -> bool {
        match self.try_forward(request).await {
            Ok(()) => true,
            Err(error) => {
                warn!(error = %error, url = %request.url, "handoff to manager failed");
                false
            }
        }
    }
}
