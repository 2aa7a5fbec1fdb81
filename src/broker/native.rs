//! Browser-level watcher: native downloads, context menu and toolbar icon.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::classifier::derive_filename;
use crate::manager::{DownloadRequest, ManagerStatus};

use super::events::{BrowserEvent, ContextMenuClick, NativeDownload};
use super::feedback::{FeedbackEmitter, Notification};
use super::host::BrowserHost;
use super::{Handoff, HandoffOutcome, HandoffResult};

/// Handles events that do not belong to a page.
#[derive(Clone)]
pub struct DownloadWatcher {
    handoff: Handoff,
    host: Arc<dyn BrowserHost>,
    feedback: FeedbackEmitter,
}

impl DownloadWatcher {
    pub(crate) fn new(
        handoff: Handoff,
        host: Arc<dyn BrowserHost>,
        feedback: FeedbackEmitter,
    ) -> Self {
        Self {
            handoff,
            host,
            feedback,
        }
    }

    /// Spawns the handler for `event` as an independent task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, event: BrowserEvent) -> JoinHandle<HandoffOutcome> {
        let watcher = self.clone();
        debug!(event = %event.kind(), "dispatching browser event");
        tokio::spawn(async move {
            match event {
                BrowserEvent::DownloadCreated(download) => {
                    watcher.on_download_created(download).await
                }
                BrowserEvent::ContextMenu(click) => watcher.on_context_menu(click).await,
                BrowserEvent::IconClick => watcher.on_icon_click().await,
            }
        })
    }

    /// Takes over a download the browser has already started.
    ///
    /// The native download is cancelled only after the manager accepted it;
    /// otherwise it keeps running untouched.
    #[instrument(skip(self), fields(event = "download-created", id = download.id))]
    pub async fn on_download_created(&self, download: NativeDownload) -> HandoffOutcome {
        let url = download.url.trim();
        if url.is_empty() {
            debug!("native download has no URL; leaving it to the browser");
            return HandoffOutcome::LeftNative;
        }
        let filename = derive_filename(download.filename.as_deref(), url);
        let request = DownloadRequest::new(url, filename);

        if !self.handoff.run(&request).await.is_delivered() {
            debug!(url = %request.url, "leaving native download running");
            return HandoffOutcome::LeftNative;
        }

        if let Err(error) = self.host.cancel_download(download.id).await {
            warn!(error = %error, "manager took the download but the native one could not be cancelled");
        }
        info!(filename = %request.filename, "native download moved to manager");
        self.feedback.notify(Notification::sent(&request.filename)).await;
        HandoffOutcome::Delivered
    }

    /// "Send this link" from the context menu. Manual intent: no classification.
    #[instrument(skip(self), fields(event = "context-menu"))]
    pub async fn on_context_menu(&self, click: ContextMenuClick) -> HandoffOutcome {
        self.send_link(click.link_url, None).await
    }

    /// Sends a link chosen by the user, notifying the outcome either way.
    pub async fn send_link(&self, url: String, filename: Option<&str>) -> HandoffOutcome {
        let url = url.trim();
        let filename = derive_filename(filename, url);
        if url.is_empty() {
            warn!("refusing to send an empty link");
            self.feedback.notify(Notification::failed(&filename)).await;
            return HandoffOutcome::NotDelivered;
        }
        let request = DownloadRequest::new(url, filename);
        match self.handoff.run(&request).await {
            HandoffResult::Delivered => {
                self.feedback.notify(Notification::sent(&request.filename)).await;
                HandoffOutcome::Delivered
            }
            HandoffResult::ManagerUnavailable => {
                self.feedback.notify(Notification::not_running()).await;
                HandoffOutcome::NotDelivered
            }
            HandoffResult::ForwardFailed => {
                self.feedback.notify(Notification::failed(&request.filename)).await;
                HandoffOutcome::NotDelivered
            }
        }
    }

    /// Toolbar icon: report reachability, never forward.
    #[instrument(skip(self), fields(event = "icon-click"))]
    pub async fn on_icon_click(&self) -> HandoffOutcome {
        let status = self.status().await;
        self.feedback.notify(Notification::status(status)).await;
        HandoffOutcome::Reported(status)
    }

    /// Current manager status for the popup.
    pub async fn status(&self) -> ManagerStatus {
        ManagerStatus::from_reachable(self.handoff.probe().await)
    }
}
