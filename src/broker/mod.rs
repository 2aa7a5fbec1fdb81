//! Event interceptors that hand downloads off to the manager.
//!
//! # Architecture
//!
//! - [`InteractionWatcher`] - page-level click/submit watcher, one per page
//! - [`DownloadWatcher`] - browser-level watcher for native downloads, the
//!   context-menu action and the toolbar icon
//! - [`Handoff`] - probe-then-forward sequence shared by both watchers
//! - [`FeedbackEmitter`] - inline link feedback and notifications
//! - [`host`] - traits the browser host implements
//!
//! Every event runs as its own tokio task. Tasks for different events are
//! not ordered with respect to each other.

mod events;
mod feedback;
pub mod host;
mod interaction;
mod native;

pub use events::{
    BrowserEvent, ClickEvent, ContextMenuClick, DownloadId, EventKind, ModifierKey, Modifiers,
    NativeDownload, PageEvent, SubmitEvent,
};
pub use feedback::{
    DEFAULT_REVERT_AFTER, FeedbackEmitter, NOTIFICATION_TITLE, Notification, NotificationKind,
    SENT_COLOR, SENT_LABEL,
};
pub use host::{BrowserHost, DomElement, EventControl, HostError, PageDocument};
pub use interaction::{InteractionWatcher, PageDecision};
pub use native::DownloadWatcher;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::classifier::{AttributeScope, LinkClassifier};
use crate::manager::{DownloadRequest, Forwarder, ManagerStatus, Probe};

/// Terminal state of one handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The broker did not interfere; the browser handles the event.
    PassedThrough,
    /// A form submission was observed and left to the browser.
    Observed,
    /// The manager accepted the download.
    Delivered,
    /// The handoff failed and the URL was reopened in a new context.
    FellBack,
    /// The handoff failed and the native download was left running.
    LeftNative,
    /// A manual send failed and the user was notified.
    NotDelivered,
    /// Manager status was reported to the user.
    Reported(ManagerStatus),
}

/// Result of the probe-then-forward sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffResult {
    /// The manager accepted the request.
    Delivered,
    /// The probe failed; nothing was forwarded.
    ManagerUnavailable,
    /// The probe succeeded but the forward did not.
    ForwardFailed,
}

impl HandoffResult {
    #[must_use]
    pub fn is_delivered(self) -> bool {
        self == Self::Delivered
    }
}

/// Probe-then-forward, with a fresh probe on every call.
#[derive(Clone)]
pub struct Handoff {
    probe: Arc<dyn Probe>,
    forwarder: Arc<dyn Forwarder>,
}

impl Handoff {
    pub fn new(probe: Arc<dyn Probe>, forwarder: Arc<dyn Forwarder>) -> Self {
        Self { probe, forwarder }
    }

    /// Probes the manager and, only if it is reachable, forwards `request`.
    #[instrument(skip(self, request), fields(url = %request.url, filename = %request.filename))]
    pub async fn run(&self, request: &DownloadRequest) -> HandoffResult {
        if !self.probe.is_reachable().await {
            debug!("manager unreachable; not forwarding");
            return HandoffResult::ManagerUnavailable;
        }
        if self.forwarder.forward(request).await {
            HandoffResult::Delivered
        } else {
            HandoffResult::ForwardFailed
        }
    }

    /// Probes the manager without forwarding anything.
    pub async fn probe(&self) -> bool {
        self.probe.is_reachable().await
    }
}

/// Behavior settings for the watchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Modifier that bypasses the broker on click.
    pub override_modifier: ModifierKey,
    /// Where download attributes are looked for.
    pub attribute_scope: AttributeScope,
    /// How long inline feedback stays on a link.
    pub feedback_revert_after: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            override_modifier: ModifierKey::default(),
            attribute_scope: AttributeScope::default(),
            feedback_revert_after: DEFAULT_REVERT_AFTER,
        }
    }
}

/// Wires the manager client and browser host into watchers.
#[derive(Clone)]
pub struct Broker {
    handoff: Handoff,
    host: Arc<dyn BrowserHost>,
    config: BrokerConfig,
}

impl Broker {
    pub fn new(
        probe: Arc<dyn Probe>,
        forwarder: Arc<dyn Forwarder>,
        host: Arc<dyn BrowserHost>,
        config: BrokerConfig,
    ) -> Self {
        Self {
            handoff: Handoff::new(probe, forwarder),
            host,
            config,
        }
    }

    /// Attaches an interaction watcher to a freshly loaded page.
    pub fn attach_page(&self, document: Arc<dyn PageDocument>) -> InteractionWatcher {
        InteractionWatcher::new(
            document,
            LinkClassifier::new(self.config.attribute_scope),
            self.config.override_modifier,
            self.handoff.clone(),
            Arc::clone(&self.host),
            self.feedback(),
        )
    }

    /// Creates the browser-level download watcher.
    pub fn download_watcher(&self) -> DownloadWatcher {
        DownloadWatcher::new(
            self.handoff.clone(),
            Arc::clone(&self.host),
            self.feedback(),
        )
    }

    fn feedback(&self) -> FeedbackEmitter {
        FeedbackEmitter::new(Arc::clone(&self.host), self.config.feedback_revert_after)
    }
}
