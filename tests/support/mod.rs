//! Shared fakes for broker tests: a scriptable probe/forwarder and an
//! in-memory browser host with a tiny DOM.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use download_broker::broker::{
    BrowserHost, DomElement, DownloadId, EventControl, HostError, Notification, PageDocument,
};
use download_broker::{DownloadRequest, Forwarder, Probe};
use url::Url;

/// Probe with a fixed answer that counts its calls.
#[derive(Debug, Default)]
pub struct FakeProbe {
    reachable: bool,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn reachable() -> Arc<Self> {
        Arc::new(Self {
            reachable: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn is_reachable(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

/// Probe that never answers, for teardown tests.
#[derive(Debug, Default)]
pub struct HangingProbe;

#[async_trait]
impl Probe for HangingProbe {
    async fn is_reachable(&self) -> bool {
        std::future::pending::<()>().await;
        false
    }
}

/// Forwarder with a fixed answer that records every request.
#[derive(Debug, Default)]
pub struct FakeForwarder {
    accept: bool,
    requests: Mutex<Vec<DownloadRequest>>,
}

impl FakeForwarder {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            accept: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forwarder for FakeForwarder {
    async fn forward(&self, request: &DownloadRequest) -> bool {
        self.requests.lock().unwrap().push(request.clone());
        self.accept
    }
}

/// Browser host that records every side effect.
#[derive(Debug, Default)]
pub struct FakeHost {
    opened: Mutex<Vec<String>>,
    cancelled: Mutex<Vec<DownloadId>>,
    notifications: Mutex<Vec<Notification>>,
    fail_notifications: AtomicBool,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Host whose notification API always fails.
    pub fn with_broken_notifications() -> Arc<Self> {
        let host = Self::default();
        host.fail_notifications.store(true, Ordering::SeqCst);
        Arc::new(host)
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<DownloadId> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserHost for FakeHost {
    async fn open_in_new_context(&self, url: &str) -> Result<(), HostError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn cancel_download(&self, id: DownloadId) -> Result<(), HostError> {
        self.cancelled.lock().unwrap().push(id);
        Ok(())
    }

    async fn notify(&self, notification: &Notification) -> Result<(), HostError> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(HostError::api("notifications.create", "permission denied"));
        }
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// In-memory DOM element.
#[derive(Debug)]
pub struct FakeElement {
    tag: String,
    attrs: HashMap<String, String>,
    text: Mutex<String>,
    color: Mutex<Option<String>>,
    parent: Option<Arc<dyn DomElement>>,
    detached: AtomicBool,
}

impl FakeElement {
    pub fn new(tag: &str, attrs: &[(&str, &str)], text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            text: Mutex::new(text.to_string()),
            color: Mutex::new(None),
            parent: None,
            detached: AtomicBool::new(false),
        }
    }

    /// `<a href=..>text</a>`
    pub fn link(href: &str, text: &str) -> Arc<Self> {
        Arc::new(Self::new("a", &[("href", href)], text))
    }

    pub fn with_parent(mut self, parent: Arc<dyn DomElement>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_color(self, color: &str) -> Self {
        *self.color.lock().unwrap() = Some(color.to_string());
        self
    }

    /// Makes every later mutation fail as if the element left the page.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    pub fn color(&self) -> Option<String> {
        self.color.lock().unwrap().clone()
    }
}

impl DomElement for FakeElement {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attrs.get(name).cloned()
    }

    fn text_content(&self) -> String {
        self.text()
    }

    fn parent(&self) -> Option<Arc<dyn DomElement>> {
        self.parent.clone()
    }

    fn set_text_content(&self, text: &str) -> Result<(), HostError> {
        if self.detached.load(Ordering::SeqCst) {
            return Err(HostError::Detached);
        }
        *self.text.lock().unwrap() = text.to_string();
        Ok(())
    }

    fn style_color(&self) -> Option<String> {
        self.color()
    }

    fn set_style_color(&self, color: Option<&str>) -> Result<(), HostError> {
        if self.detached.load(Ordering::SeqCst) {
            return Err(HostError::Detached);
        }
        *self.color.lock().unwrap() = color.map(str::to_string);
        Ok(())
    }
}

/// Page with a fixed URL and marker flag.
#[derive(Debug, Default)]
pub struct FakeDocument {
    url: Option<Url>,
    marker: bool,
}

impl FakeDocument {
    pub fn blank() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn at(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: Url::parse(url).ok(),
            marker: false,
        })
    }

    pub fn with_marker() -> Arc<Self> {
        Arc::new(Self {
            url: None,
            marker: true,
        })
    }
}

impl PageDocument for FakeDocument {
    fn url(&self) -> Option<Url> {
        self.url.clone()
    }

    fn has_download_marker(&self) -> bool {
        self.marker
    }
}

/// Records default-action control calls.
#[derive(Debug, Default)]
pub struct RecordingControl {
    prevented: AtomicUsize,
    stopped: AtomicUsize,
}

impl RecordingControl {
    pub fn prevented(&self) -> usize {
        self.prevented.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl EventControl for RecordingControl {
    fn prevent_default(&self) {
        self.prevented.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_propagation(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}
