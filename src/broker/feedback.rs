//! User-visible feedback: inline link labels and system notifications.
//!
//! Feedback is best effort. A host error while rendering is logged and never
//! changes the outcome of a handoff.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::manager::ManagerStatus;

use super::host::{BrowserHost, DomElement};

/// Title of every notification.
pub const NOTIFICATION_TITLE: &str = "Download Manager";

/// Label shown on a link after a successful handoff.
pub const SENT_LABEL: &str = "✓ Sent to Download Manager";

/// Text color shown on a link after a successful handoff.
pub const SENT_COLOR: &str = "#4CAF50";

/// How long inline feedback stays before the link is restored.
pub const DEFAULT_REVERT_AFTER: Duration = Duration::from_secs(2);

/// What a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Sent,
    NotRunning,
    Failed,
    Status(ManagerStatus),
}

/// A system notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    fn new(kind: NotificationKind, message: String) -> Self {
        Self {
            kind,
            title: NOTIFICATION_TITLE.to_string(),
            message,
        }
    }

    /// `filename` was accepted by the manager.
    #[must_use]
    pub fn sent(filename: &str) -> Self {
        Self::new(
            NotificationKind::Sent,
            format!("Sent to Download Manager: {filename}"),
        )
    }

    /// The manager did not answer the probe.
    #[must_use]
    pub fn not_running() -> Self {
        Self::new(
            NotificationKind::NotRunning,
            "Download Manager is not running. Start it and try again.".to_string(),
        )
    }

    /// The manager answered the probe but the handoff of `filename` failed.
    #[must_use]
    pub fn failed(filename: &str) -> Self {
        Self::new(
            NotificationKind::Failed,
            format!("Could not send {filename} to Download Manager"),
        )
    }

    /// Current manager status, for the toolbar icon.
    #[must_use]
    pub fn status(status: ManagerStatus) -> Self {
        let message = match status {
            ManagerStatus::Connected => "Download Manager is connected".to_string(),
            ManagerStatus::NotRunning => "Download Manager is not running".to_string(),
        };
        Self::new(NotificationKind::Status(status), message)
    }
}

/// Label and color a link had before feedback was put on it.
#[derive(Debug, Clone)]
struct Original {
    text: String,
    color: Option<String>,
}

struct PendingRevert {
    generation: u64,
    original: Original,
    // Pins the element so its address cannot be reused while pending.
    _element: Arc<dyn DomElement>,
    task: AbortHandle,
}

/// Reverts that have not run yet, at most one per element.
#[derive(Default)]
struct PendingReverts {
    next_generation: u64,
    by_element: HashMap<usize, PendingRevert>,
}

fn element_key(element: &Arc<dyn DomElement>) -> usize {
    Arc::as_ptr(element).cast::<()>().addr()
}

/// Renders feedback through the browser host.
#[derive(Clone)]
pub struct FeedbackEmitter {
    host: Arc<dyn BrowserHost>,
    revert_after: Duration,
    pending: Arc<Mutex<PendingReverts>>,
}

impl FeedbackEmitter {
    pub fn new(host: Arc<dyn BrowserHost>, revert_after: Duration) -> Self {
        Self {
            host,
            revert_after,
            pending: Arc::default(),
        }
    }

    /// Marks `link` as sent, then restores its label and color after the
    /// revert interval.
    ///
    /// Showing feedback again on a link that still shows it restarts the
    /// interval and keeps the label from before the first success.
    ///
    /// Returns the revert task, or `None` when the link could not be updated.
    pub fn show_inline_success(&self, link: Arc<dyn DomElement>) -> Option<JoinHandle<()>> {
        let key = element_key(&link);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let original = pending.by_element.get(&key).map_or_else(
            || Original {
                text: link.text_content(),
                color: link.style_color(),
            },
            |earlier| earlier.original.clone(),
        );

        if let Err(error) = link
            .set_text_content(SENT_LABEL)
            .and_then(|()| link.set_style_color(Some(SENT_COLOR)))
        {
            warn!(error = %error, "could not show inline feedback");
            return None;
        }

        if let Some(earlier) = pending.by_element.remove(&key) {
            earlier.task.abort();
            debug!("inline feedback shown again; revert timer restarted");
        }
        let generation = pending.next_generation;
        pending.next_generation += 1;

        let task = tokio::spawn(revert_later(
            Arc::clone(&link),
            original.clone(),
            self.revert_after,
            Arc::clone(&self.pending),
            key,
            generation,
        ));
        pending.by_element.insert(
            key,
            PendingRevert {
                generation,
                original,
                _element: link,
                task: task.abort_handle(),
            },
        );
        Some(task)
    }

    /// Shows a notification; failures are logged only.
    pub async fn notify(&self, notification: Notification) {
        if let Err(error) = self.host.notify(&notification).await {
            warn!(error = %error, message = %notification.message, "notification failed");
        }
    }
}

async fn revert_later(
    link: Arc<dyn DomElement>,
    original: Original,
    revert_after: Duration,
    pending: Arc<Mutex<PendingReverts>>,
    key: usize,
    generation: u64,
) {
    tokio::time::sleep(revert_after).await;
    {
        let mut pending = pending.lock().unwrap_or_else(PoisonError::into_inner);
        let current = pending
            .by_element
            .get(&key)
            .is_some_and(|entry| entry.generation == generation);
        if !current {
            return;
        }
        pending.by_element.remove(&key);
    }

    let restored = link
        .set_text_content(&original.text)
        .and_then(|()| link.set_style_color(original.color.as_deref()));
    match restored {
        Ok(()) => debug!("inline feedback reverted"),
        Err(error) => debug!(error = %error, "link gone before feedback revert"),
    }
}
