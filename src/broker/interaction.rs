//! Page-level watcher for link clicks and form submissions.
//!
//! A click on a download link is claimed synchronously (default prevented,
//! propagation stopped) and then handed off asynchronously. Once claimed the
//! click can no longer fall back to the browser's default action, so every
//! failed handoff ends with the URL being reopened explicitly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, instrument, warn};

use crate::classifier::{DownloadCandidate, DownloadMarkers, LinkClassifier};

use super::events::{ClickEvent, ModifierKey, PageEvent, SubmitEvent};
use super::feedback::FeedbackEmitter;
use super::host::{
    BrowserHost, DomElement, EventControl, PageDocument, closest_link, has_download_attribute,
};
use super::{Handoff, HandoffOutcome, HandoffResult};

/// Explicit filename attributes, in priority order.
const FILENAME_ATTRIBUTES: [&str; 2] = ["download", "data-download"];

/// What the watcher decided synchronously for a page event.
#[derive(Debug)]
pub enum PageDecision {
    /// The browser's default action proceeds untouched.
    PassThrough,
    /// A form submission was looked at and left to the browser.
    Observed {
        /// Whether the form target looked like a download.
        looks_like_download: bool,
    },
    /// The default action was prevented; the handoff continues in the task.
    Intercepted(JoinHandle<HandoffOutcome>),
}

impl PageDecision {
    /// Whether the default action was prevented.
    #[must_use]
    pub fn is_intercepted(&self) -> bool {
        matches!(self, Self::Intercepted(_))
    }

    /// Waits for the handoff to finish.
    ///
    /// Returns the synchronous outcome for events that were not intercepted,
    /// and `None` if the handoff task was aborted by a page teardown.
    pub async fn outcome(self) -> Option<HandoffOutcome> {
        match self {
            Self::PassThrough => Some(HandoffOutcome::PassedThrough),
            Self::Observed { .. } => Some(HandoffOutcome::Observed),
            Self::Intercepted(handle) => handle.await.ok(),
        }
    }
}

/// Tasks started on behalf of one page; aborted when the page goes away.
#[derive(Debug, Default)]
struct PageScope {
    state: Mutex<ScopeState>,
}

#[derive(Debug, Default)]
struct ScopeState {
    tasks: Vec<AbortHandle>,
    torn_down: bool,
}

impl PageScope {
    fn lock(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tracks `handle`, or aborts it at once if the page is already gone.
    fn track(&self, handle: AbortHandle) {
        let mut state = self.lock();
        if state.torn_down {
            handle.abort();
            return;
        }
        state.tasks.retain(|task| !task.is_finished());
        state.tasks.push(handle);
    }

    fn is_torn_down(&self) -> bool {
        self.lock().torn_down
    }

    fn in_flight(&self) -> usize {
        self.lock()
            .tasks
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    fn abort_all(&self) -> usize {
        let mut state = self.lock();
        state.torn_down = true;
        let aborted = state.tasks.iter().filter(|task| !task.is_finished()).count();
        for task in state.tasks.drain(..) {
            task.abort();
        }
        aborted
    }
}

/// Watches clicks and submissions on a single page.
pub struct InteractionWatcher {
    document: Arc<dyn PageDocument>,
    classifier: LinkClassifier,
    override_modifier: ModifierKey,
    handoff: Handoff,
    host: Arc<dyn BrowserHost>,
    feedback: FeedbackEmitter,
    scope: Arc<PageScope>,
}

impl InteractionWatcher {
    pub(crate) fn new(
        document: Arc<dyn PageDocument>,
        classifier: LinkClassifier,
        override_modifier: ModifierKey,
        handoff: Handoff,
        host: Arc<dyn BrowserHost>,
        feedback: FeedbackEmitter,
    ) -> Self {
        Self {
            document,
            classifier,
            override_modifier,
            handoff,
            host,
            feedback,
            scope: Arc::new(PageScope::default()),
        }
    }

    /// Routes a page event to its handler.
    pub fn dispatch(&self, event: &PageEvent, control: &dyn EventControl) -> PageDecision {
        match event {
            PageEvent::Click(click) => self.on_click(click, control),
            PageEvent::Submit(submit) => self.on_submit(submit),
        }
    }

    /// Handles a click.
    ///
    /// Must be called from within a tokio runtime: an intercepted click
    /// spawns its handoff task.
    #[instrument(skip_all, fields(event = "click"))]
    pub fn on_click(&self, click: &ClickEvent, control: &dyn EventControl) -> PageDecision {
        if self.scope.is_torn_down() {
            return PageDecision::PassThrough;
        }
        if click.modifiers.is_held(self.override_modifier) {
            debug!(
                modifier = self.override_modifier.as_str(),
                "override modifier held; leaving click to the browser"
            );
            return PageDecision::PassThrough;
        }

        let Some(link) = closest_link(Arc::clone(&click.target)) else {
            return PageDecision::PassThrough;
        };
        let Some(candidate) = self.candidate_for(link.as_ref()) else {
            return PageDecision::PassThrough;
        };

        let markers = DownloadMarkers {
            on_page: self.document.has_download_marker(),
            on_element: has_download_attribute(link.as_ref()),
        };
        let Some(reason) =
            self.classifier
                .explain(&candidate.url, &candidate.source_text, markers)
        else {
            return PageDecision::PassThrough;
        };

        control.prevent_default();
        control.stop_propagation();
        info!(url = %candidate.url, %reason, "intercepted download click");

        let handle = tokio::spawn(hand_off_click(
            candidate,
            link,
            self.handoff.clone(),
            Arc::clone(&self.host),
            self.feedback.clone(),
            Arc::clone(&self.scope),
        ));
        self.scope.track(handle.abort_handle());
        PageDecision::Intercepted(handle)
    }

    /// Observes a form submission. Submissions are never intercepted; the
    /// resulting native download is picked up by the download watcher.
    #[instrument(skip_all, fields(event = "submit"))]
    pub fn on_submit(&self, submit: &SubmitEvent) -> PageDecision {
        let base = self.document.url();
        let looks_like_download =
            DownloadCandidate::from_link(&submit.action, &submit.label, None, base.as_ref())
                .is_some_and(|candidate| {
                    let markers = DownloadMarkers {
                        on_page: self.document.has_download_marker(),
                        on_element: false,
                    };
                    self.classifier
                        .classify(&candidate.url, &candidate.source_text, markers)
                });
        debug!(
            action = %submit.action,
            looks_like_download,
            "form submission left to the browser"
        );
        PageDecision::Observed {
            looks_like_download,
        }
    }

    /// Number of handoffs still running for this page.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.scope.in_flight()
    }

    /// Abandons all in-flight continuations for this page.
    pub fn teardown(&self) {
        let aborted = self.scope.abort_all();
        if aborted > 0 {
            debug!(aborted, "page torn down with handoffs in flight");
        }
    }

    fn candidate_for(&self, link: &dyn DomElement) -> Option<DownloadCandidate> {
        let href = link.attribute("href")?;
        let explicit = FILENAME_ATTRIBUTES
            .iter()
            .filter_map(|name| link.attribute(name))
            .find(|value| !value.trim().is_empty());
        let base = self.document.url();
        DownloadCandidate::from_link(
            &href,
            &link.text_content(),
            explicit.as_deref(),
            base.as_ref(),
        )
    }
}

impl Drop for InteractionWatcher {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn hand_off_click(
    candidate: DownloadCandidate,
    link: Arc<dyn DomElement>,
    handoff: Handoff,
    host: Arc<dyn BrowserHost>,
    feedback: FeedbackEmitter,
    scope: Arc<PageScope>,
) -> HandoffOutcome {
    let url = candidate.url.clone();
    match handoff.run(&candidate.into_request()).await {
        HandoffResult::Delivered => {
            if let Some(revert) = feedback.show_inline_success(link) {
                scope.track(revert.abort_handle());
            }
            HandoffOutcome::Delivered
        }
        result @ (HandoffResult::ManagerUnavailable | HandoffResult::ForwardFailed) => {
            info!(url = %url, ?result, "handoff failed; opening link in a new tab");
            if let Err(error) = host.open_in_new_context(&url).await {
                warn!(error = %error, url = %url, "fallback navigation failed");
            }
            HandoffOutcome::FellBack
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_page_scope_aborts_tasks_tracked_after_teardown() {
        let scope = PageScope::default();
        assert_eq!(scope.abort_all(), 0);

        let late = tokio::spawn(tokio::time::sleep(Duration::from_secs(60)));
        scope.track(late.abort_handle());

        let joined = late.await;
        assert!(joined.is_err_and(|error| error.is_cancelled()));
        assert_eq!(scope.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_page_scope_keeps_tasks_until_teardown() {
        let scope = PageScope::default();
        let task = tokio::spawn(tokio::time::sleep(Duration::from_secs(60)));
        scope.track(task.abort_handle());
        assert_eq!(scope.in_flight(), 1);

        assert_eq!(scope.abort_all(), 1);
        assert!(task.await.is_err_and(|error| error.is_cancelled()));
    }
}
