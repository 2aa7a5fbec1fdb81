//! Download Broker Library
//!
//! This library decides whether a browser interaction is a download and,
//! when it is, hands the download to a separately running download manager
//! on loopback, suppressing the browser's own download when the handoff
//! succeeds.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`classifier`] - Pure download heuristic and filename derivation
//! - [`manager`] - Probe and forwarder for the manager's HTTP protocol
//! - [`broker`] - Click, submit and native-download interceptors with
//!   feedback and fallback
//!
//! The browser itself is an external collaborator: hosts implement the
//! traits in [`broker::host`].

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod broker;
pub mod classifier;
pub mod manager;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use broker::{
    Broker, BrokerConfig, BrowserEvent, DownloadWatcher, Handoff, HandoffOutcome, HandoffResult,
    InteractionWatcher, PageDecision, PageEvent,
};
pub use classifier::{
    AttributeScope, DownloadCandidate, DownloadMarkers, LinkClassifier, derive_filename,
    matches_download_pattern,
};
pub use manager::{
    DEFAULT_MANAGER_PORT, DownloadRequest, Forwarder, ManagerClient, ManagerConfig, ManagerError,
    ManagerStatus, Probe,
};
