//! Download classification heuristic.
//!
//! Decides whether a link (URL plus label) looks like a downloadable
//! resource. Classification is pure and synchronous: it never touches the
//! network or the filesystem.
//!
//! A candidate is a download when either
//! - the URL, its path, or its label matches a filename pattern
//!   (see [`patterns`]), or
//! - a download-indicating attribute is present. Whether that attribute is
//!   looked up page-wide or only on the clicked link is set by
//!   [`AttributeScope`].

pub mod filename;
pub mod patterns;

use std::fmt;
use std::str::FromStr;

use tracing::trace;
use url::Url;

use crate::manager::DownloadRequest;

pub use filename::{FALLBACK_FILENAME, derive_filename, filename_from_url, resolve_href};
pub use patterns::{FileGroup, PatternMatch, match_value};

/// Attributes whose presence marks an element as a download link.
pub const DOWNLOAD_ATTRIBUTES: [&str; 3] = ["download", "data-download", "data-file"];

/// Where download-indicating attributes are looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeScope {
    /// Any marked element anywhere on the page counts for every link.
    #[default]
    Page,
    /// Only attributes on the link being classified count.
    Element,
}

impl AttributeScope {
    /// Returns the stable config label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Element => "element",
        }
    }
}

impl FromStr for AttributeScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "page" => Ok(Self::Page),
            "element" => Ok(Self::Element),
            other => Err(format!("unknown attribute scope '{other}' (expected page or element)")),
        }
    }
}

/// Attribute evidence gathered by the host for one classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadMarkers {
    /// Some element on the current page carries a download attribute.
    pub on_page: bool,
    /// The link being classified carries a download attribute itself.
    pub on_element: bool,
}

impl DownloadMarkers {
    /// No attribute evidence at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Why a candidate was classified as a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadReason {
    /// The URL matched a filename pattern.
    Url(PatternMatch),
    /// The link label matched a filename pattern.
    Text(PatternMatch),
    /// A download attribute was present in the configured scope.
    Attribute(AttributeScope),
}

impl fmt::Display for DownloadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(m) => write!(f, "url:{m}"),
            Self::Text(m) => write!(f, "text:{m}"),
            Self::Attribute(scope) => write!(f, "attribute:{}", scope.as_str()),
        }
    }
}

/// Pattern-only half of the heuristic, without attribute evidence.
#[must_use]
pub fn matches_download_pattern(url: &str, text: &str) -> bool {
    pattern_reason(url, text).is_some()
}

fn pattern_reason(url: &str, text: &str) -> Option<DownloadReason> {
    if let Some(m) = match_value(url) {
        return Some(DownloadReason::Url(m));
    }
    if let Some(m) = url_path(url).as_deref().and_then(match_value) {
        return Some(DownloadReason::Url(m));
    }
    match_value(text).map(DownloadReason::Text)
}

/// URL with query and fragment removed, so `file.zip?x=1` still ends in `.zip`.
fn url_path(url: &str) -> Option<String> {
    let end = url.find(['?', '#'])?;
    Some(url[..end].to_string())
}

/// The download classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkClassifier {
    scope: AttributeScope,
}

impl LinkClassifier {
    /// Creates a classifier with the given attribute scope.
    #[must_use]
    pub fn new(scope: AttributeScope) -> Self {
        Self { scope }
    }

    /// Returns true when the candidate looks like a download.
    #[must_use]
    pub fn classify(&self, url: &str, text: &str, markers: DownloadMarkers) -> bool {
        self.explain(url, text, markers).is_some()
    }

    /// Like [`classify`](Self::classify), but reports the first matching rule.
    #[must_use]
    pub fn explain(&self, url: &str, text: &str, markers: DownloadMarkers) -> Option<DownloadReason> {
        let reason = pattern_reason(url, text).or_else(|| {
            let marked = match self.scope {
                AttributeScope::Page => markers.on_page || markers.on_element,
                AttributeScope::Element => markers.on_element,
            };
            marked.then_some(DownloadReason::Attribute(self.scope))
        });
        trace!(url, reason = ?reason, "classified link");
        reason
    }
}

/// A link the user interacted with, ready to be handed off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCandidate {
    /// Absolute URL when the href could be resolved, otherwise the raw href.
    pub url: String,
    /// Filename derived from attributes or the URL; never empty.
    pub suggested_filename: String,
    /// Visible link label, possibly empty.
    pub source_text: String,
}

impl DownloadCandidate {
    /// Builds a candidate from a raw href.
    ///
    /// The href is resolved against `base` when possible. Returns `None`
    /// for an empty href.
    #[must_use]
    pub fn from_link(
        href: &str,
        text: &str,
        explicit_filename: Option<&str>,
        base: Option<&Url>,
    ) -> Option<Self> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let url = resolve_href(href, base).map_or_else(|| href.to_string(), String::from);
        let suggested_filename = derive_filename(explicit_filename, &url);
        Some(Self {
            url,
            suggested_filename,
            source_text: text.trim().to_string(),
        })
    }

    /// Converts the candidate into the wire request.
    #[must_use]
    pub fn into_request(self) -> DownloadRequest {
        DownloadRequest::new(self.url, self.suggested_filename)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_extension_in_url() {
        let classifier = LinkClassifier::default();
        assert!(classifier.classify("https://x/file.zip", "Get", DownloadMarkers::none()));
        assert!(classifier.classify("https://x/FILE.PDF", "", DownloadMarkers::none()));
    }

    #[test]
    fn test_classify_extension_before_query_string() {
        let classifier = LinkClassifier::default();
        assert!(classifier.classify(
            "https://x/file.zip?token=1",
            "",
            DownloadMarkers::none()
        ));
        assert!(classifier.classify("https://x/movie.mkv#t=10", "", DownloadMarkers::none()));
    }

    #[test]
    fn test_classify_label_only() {
        let classifier = LinkClassifier::default();
        assert!(classifier.classify("https://x/get?id=7", "Download now", DownloadMarkers::none()));
        assert!(classifier.classify("https://x/get?id=7", "setup.exe", DownloadMarkers::none()));
    }

    #[test]
    fn test_classify_relative_url() {
        let classifier = LinkClassifier::default();
        assert!(classifier.classify("/files/photo.jpeg", "", DownloadMarkers::none()));
    }

    #[test]
    fn test_classify_plain_link_is_not_a_download() {
        let classifier = LinkClassifier::default();
        assert!(!classifier.classify("https://x/about", "About us", DownloadMarkers::none()));
        assert!(!classifier.classify("", "", DownloadMarkers::none()));
    }

    #[test]
    fn test_classify_page_scope_uses_any_marker_on_page() {
        let classifier = LinkClassifier::new(AttributeScope::Page);
        let markers = DownloadMarkers {
            on_page: true,
            on_element: false,
        };
        assert!(classifier.classify("https://x/about", "About us", markers));
        assert_eq!(
            classifier.explain("https://x/about", "About us", markers),
            Some(DownloadReason::Attribute(AttributeScope::Page))
        );
    }

    #[test]
    fn test_classify_element_scope_ignores_other_marked_elements() {
        let classifier = LinkClassifier::new(AttributeScope::Element);
        let elsewhere = DownloadMarkers {
            on_page: true,
            on_element: false,
        };
        assert!(!classifier.classify("https://x/about", "About us", elsewhere));

        let on_link = DownloadMarkers {
            on_page: true,
            on_element: true,
        };
        assert!(classifier.classify("https://x/about", "About us", on_link));
    }

    #[test]
    fn test_explain_reports_url_before_text() {
        let classifier = LinkClassifier::default();
        assert_eq!(
            classifier.explain("https://x/a.zip", "Download", DownloadMarkers::none()),
            Some(DownloadReason::Url(PatternMatch::Extension(FileGroup::Archive)))
        );
        assert_eq!(
            classifier.explain("https://x/a", "report.pdf", DownloadMarkers::none()),
            Some(DownloadReason::Text(PatternMatch::Extension(FileGroup::Document)))
        );
    }

    #[test]
    fn test_matches_download_pattern_ignores_attributes() {
        assert!(matches_download_pattern("https://x/a.mp3", ""));
        assert!(!matches_download_pattern("https://x/a", "home"));
    }

    #[test]
    fn test_attribute_scope_from_str() {
        assert_eq!("page".parse::<AttributeScope>().unwrap(), AttributeScope::Page);
        assert_eq!(
            "element".parse::<AttributeScope>().unwrap(),
            AttributeScope::Element
        );
        assert!("global".parse::<AttributeScope>().is_err());
    }

    #[test]
    fn test_candidate_from_link_resolves_and_derives_filename() {
        let base = Url::parse("https://site.example/downloads/").unwrap();
        let candidate =
            DownloadCandidate::from_link("files/tool.msi", " Installer ", None, Some(&base)).unwrap();
        assert_eq!(candidate.url, "https://site.example/downloads/files/tool.msi");
        assert_eq!(candidate.suggested_filename, "tool.msi");
        assert_eq!(candidate.source_text, "Installer");

        let request = candidate.into_request();
        assert_eq!(request.filename, "tool.msi");
    }

    #[test]
    fn test_candidate_from_link_rejects_empty_href() {
        assert!(DownloadCandidate::from_link("  ", "x", None, None).is_none());
    }

    #[test]
    fn test_candidate_keeps_unresolvable_href() {
        let candidate = DownloadCandidate::from_link("files/a.zip", "", None, None).unwrap();
        assert_eq!(candidate.url, "files/a.zip");
        assert_eq!(candidate.suggested_filename, "a.zip");
    }
}
