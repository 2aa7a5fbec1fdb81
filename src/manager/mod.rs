//! Client side of the local download-manager protocol.
//!
//! The manager listens on loopback and serves two endpoints:
//!
//! | Method | Path            | Body                        |
//! |--------|-----------------|-----------------------------|
//! | GET    | `/ping`         | none                        |
//! | POST   | `/add_download` | `{"url": .., "filename": ..}` |
//!
//! Any 2xx status counts as success. Everything else, including transport
//! failures, is folded into `false` at the [`Probe`] / [`Forwarder`]
//! boundary.
//!
//! # Example
//!
//! ```no_run
//! use download_broker::manager::{DownloadRequest, Forwarder, ManagerClient, ManagerConfig, Probe};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ManagerClient::new(&ManagerConfig::default())?;
//! if client.is_reachable().await {
//!     let sent = client
//!         .forward(&DownloadRequest::from_url("https://example.com/file.zip"))
//!         .await;
//!     println!("sent: {sent}");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::ManagerClient;
pub use error::ManagerError;

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::classifier::derive_filename;

/// Host the manager listens on. Always loopback.
pub const MANAGER_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Default manager port.
pub const DEFAULT_MANAGER_PORT: u16 = 8080;

/// Liveness endpoint.
pub const PING_PATH: &str = "/ping";

/// Handoff endpoint.
pub const ADD_DOWNLOAD_PATH: &str = "/add_download";

/// Default connect timeout for manager requests (loopback should answer fast).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default overall request timeout for manager requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable connection settings shared by the probe and the forwarder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// TCP port of the manager on loopback.
    pub port: u16,
    /// Connect timeout for each request.
    pub connect_timeout: Duration,
    /// Overall timeout for each request.
    pub request_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_MANAGER_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ManagerConfig {
    /// Default settings on a different port.
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// Base URL of the manager, e.g. `http://127.0.0.1:8080/`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{MANAGER_HOST}:{}/", self.port)
    }
}

/// Body of a `POST /add_download` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Absolute URL of the resource.
    pub url: String,
    /// Filename the manager should save under.
    pub filename: String,
}

impl DownloadRequest {
    /// Creates a request with an explicit filename.
    ///
    /// A blank filename is replaced by one derived from the URL.
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        let url = url.into();
        let filename = filename.into();
        let filename = derive_filename(Some(&filename), &url);
        Self { url, filename }
    }

    /// Creates a request whose filename is derived from the URL alone.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let filename = derive_filename(None, &url);
        Self { url, filename }
    }
}

/// Reachability of the manager as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerStatus {
    Connected,
    NotRunning,
}

impl ManagerStatus {
    /// Maps a probe result to a status.
    #[must_use]
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            Self::Connected
        } else {
            Self::NotRunning
        }
    }

    /// Returns the popup label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::NotRunning => "not running",
        }
    }
}

impl fmt::Display for ManagerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liveness check against the manager.
///
/// Implementations must not fail visibly: any error collapses to `false`.
/// No retries; a single failed probe means "manager absent for this event".
#[async_trait]
pub trait Probe: Send + Sync {
    /// Returns true when the manager answered `/ping` with a success status.
    async fn is_reachable(&self) -> bool;
}

/// Sends a download request to the manager.
///
/// Implementations must not fail visibly: rejection and transport failure
/// both collapse to `false`.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Returns true when the manager accepted the request.
    async fn forward(&self, request: &DownloadRequest) -> bool;
}
