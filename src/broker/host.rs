//! Browser-host contract.
//!
//! The broker never talks to a browser directly. The host (an extension
//! runtime, a native-messaging shim, or a test fake) implements these traits
//! and feeds events into the watchers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::classifier::DOWNLOAD_ATTRIBUTES;

use super::events::DownloadId;
use super::feedback::Notification;

/// Errors reported by the browser host.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// The element was removed from the page before it could be updated.
    #[error("element is no longer attached to the page")]
    Detached,

    /// A browser API call failed.
    #[error("browser API '{api}' failed: {message}")]
    Api {
        /// The API that failed (e.g. `downloads.cancel`).
        api: &'static str,
        /// Host-provided error message.
        message: String,
    },
}

impl HostError {
    /// Creates an API error.
    pub fn api(api: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            api,
            message: message.into(),
        }
    }
}

/// A live element in the page.
pub trait DomElement: fmt::Debug + Send + Sync {
    /// Lowercase or uppercase tag name, e.g. `a`.
    fn tag_name(&self) -> String;

    /// Attribute value, `Some("")` for a present but empty attribute.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Visible text of the element.
    fn text_content(&self) -> String;

    /// Parent element, `None` at the document root.
    fn parent(&self) -> Option<Arc<dyn DomElement>>;

    /// Replaces the visible text.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the element cannot be updated.
    fn set_text_content(&self, text: &str) -> Result<(), HostError>;

    /// Current inline text color, if any.
    fn style_color(&self) -> Option<String>;

    /// Sets or clears the inline text color.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the element cannot be updated.
    fn set_style_color(&self, color: Option<&str>) -> Result<(), HostError>;
}

/// Walks from `element` up to the nearest `<a>` that has an `href`.
#[must_use]
pub fn closest_link(element: Arc<dyn DomElement>) -> Option<Arc<dyn DomElement>> {
    let mut current = Some(element);
    while let Some(node) = current {
        if node.tag_name().eq_ignore_ascii_case("a") && node.attribute("href").is_some() {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

/// Returns true when the element itself carries a download attribute.
#[must_use]
pub fn has_download_attribute(element: &dyn DomElement) -> bool {
    DOWNLOAD_ATTRIBUTES
        .iter()
        .any(|name| element.attribute(name).is_some())
}

/// The page an interaction watcher is attached to.
pub trait PageDocument: Send + Sync {
    /// URL of the page, used to resolve relative hrefs.
    fn url(&self) -> Option<Url>;

    /// Whether any element on the page currently carries a download attribute.
    fn has_download_marker(&self) -> bool;
}

/// Default-action control for a single page event.
pub trait EventControl {
    /// Stops the browser's default navigation or download.
    fn prevent_default(&self);

    /// Stops the event reaching other listeners.
    fn stop_propagation(&self);
}

/// Browser-level capabilities used by the broker.
#[async_trait]
pub trait BrowserHost: Send + Sync {
    /// Opens `url` in a new tab or window.
    async fn open_in_new_context(&self, url: &str) -> Result<(), HostError>;

    /// Cancels an in-flight native download.
    async fn cancel_download(&self, id: DownloadId) -> Result<(), HostError>;

    /// Shows a transient system notification.
    async fn notify(&self, notification: &Notification) -> Result<(), HostError>;
}
