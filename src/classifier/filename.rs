//! Filename derivation and href resolution for download candidates.
//!
//! Derivation is total: every input produces a non-empty name, in priority
//! order explicit name > last URL path segment > [`FALLBACK_FILENAME`].

use std::sync::LazyLock;

use url::{ParseError, Url};

/// Filename used when neither an explicit name nor a URL segment is available.
pub const FALLBACK_FILENAME: &str = "download";

/// Base used to give relative hrefs a path when the page has no URL.
#[allow(clippy::expect_used)]
static PLACEHOLDER_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("placeholder base is valid")); // Static URL, safe to panic

/// Resolves an href against the page URL.
///
/// Absolute hrefs are returned as-is. Relative hrefs need `base`; without one
/// the href cannot be resolved and `None` is returned.
#[must_use]
pub fn resolve_href(href: &str, base: Option<&Url>) -> Option<Url> {
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(ParseError::RelativeUrlWithoutBase) => base.and_then(|base| base.join(href).ok()),
        Err(_) => None,
    }
}

/// Extracts the last path segment of `url`, query and fragment stripped.
///
/// Relative URLs are accepted. Percent-encoding is decoded; a segment that
/// does not decode to UTF-8 is kept verbatim.
#[must_use]
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url)
        .or_else(|_| PLACEHOLDER_BASE.join(url))
        .ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |d| d.into_owned());
    clean_name(&decoded)
}

/// Derives the filename sent to the manager.
///
/// `explicit` is a `download`/`data-download` attribute value or the
/// browser's own filename for a native download (which may be a full path;
/// only its final component is kept).
#[must_use]
pub fn derive_filename(explicit: Option<&str>, url: &str) -> String {
    explicit
        .and_then(base_name)
        .or_else(|| filename_from_url(url))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

fn base_name(value: &str) -> Option<String> {
    let last = value
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .last()?;
    clean_name(last)
}

fn clean_name(value: &str) -> Option<String> {
    let cleaned: String = value
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    // Dot segments name a directory, not a file.
    match cleaned {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_filename_prefers_explicit_name() {
        assert_eq!(
            derive_filename(Some("Quarterly.pdf"), "https://x/files/abc123"),
            "Quarterly.pdf"
        );
    }

    #[test]
    fn test_derive_filename_blank_explicit_falls_back_to_url() {
        assert_eq!(derive_filename(Some("   "), "https://x/file.zip"), "file.zip");
        assert_eq!(derive_filename(Some(""), "https://x/file.zip"), "file.zip");
    }

    #[test]
    fn test_derive_filename_keeps_final_component_of_paths() {
        assert_eq!(
            derive_filename(Some("/home/me/Downloads/report.pdf"), "https://x/r"),
            "report.pdf"
        );
        assert_eq!(
            derive_filename(Some(r"C:\Users\me\Downloads\setup.exe"), "https://x/s"),
            "setup.exe"
        );
    }

    #[test]
    fn test_derive_filename_strips_query_and_fragment() {
        assert_eq!(
            derive_filename(None, "https://x/dl/archive.tar.gz?token=abc#top"),
            "archive.tar.gz"
        );
    }

    #[test]
    fn test_derive_filename_decodes_percent_encoding() {
        assert_eq!(
            derive_filename(None, "https://x/My%20Report.pdf"),
            "My Report.pdf"
        );
        assert_eq!(derive_filename(None, "https://x/a%2Fb.zip"), "a_b.zip");
    }

    #[test]
    fn test_derive_filename_literal_fallback() {
        assert_eq!(derive_filename(None, "https://example.com"), FALLBACK_FILENAME);
        assert_eq!(derive_filename(None, "https://example.com/dir/"), FALLBACK_FILENAME);
        assert_eq!(derive_filename(None, ""), FALLBACK_FILENAME);
        assert_eq!(derive_filename(None, "mailto:someone@example.com"), FALLBACK_FILENAME);
    }

    #[test]
    fn test_derive_filename_relative_url() {
        assert_eq!(derive_filename(None, "/static/app.dmg"), "app.dmg");
        assert_eq!(derive_filename(None, "files/notes.docx"), "notes.docx");
    }

    #[test]
    fn test_derive_filename_rejects_dot_segments() {
        assert_eq!(derive_filename(Some(".."), "https://x/a.zip"), "a.zip");
        assert_eq!(derive_filename(Some("files/."), "https://x/"), FALLBACK_FILENAME);
        assert_eq!(derive_filename(None, "https://x/%2E%2E"), FALLBACK_FILENAME);
        assert_eq!(derive_filename(None, "dir/%2e."), FALLBACK_FILENAME);
        assert_eq!(derive_filename(None, "https://x/..."), "...");
    }

    #[test]
    fn test_derive_filename_is_idempotent() {
        let urls = [
            "https://x/file.zip",
            "https://x/My%20Report.pdf",
            "https://x/%20padded%20.iso",
            "https://x/",
            "relative/path/song.mp3",
        ];
        for url in urls {
            let first = derive_filename(None, url);
            assert!(!first.is_empty());
            assert_eq!(derive_filename(Some(&first), url), first, "{url}");
        }
    }

    #[test]
    fn test_resolve_href_absolute_ignores_base() {
        let base = Url::parse("https://page.example/docs/").unwrap();
        let resolved = resolve_href("https://cdn.example/a.zip", Some(&base)).unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example/a.zip");
    }

    #[test]
    fn test_resolve_href_relative_uses_base() {
        let base = Url::parse("https://page.example/docs/index.html").unwrap();
        let resolved = resolve_href("files/a.zip", Some(&base)).unwrap();
        assert_eq!(resolved.as_str(), "https://page.example/docs/files/a.zip");
    }

    #[test]
    fn test_resolve_href_relative_without_base() {
        assert!(resolve_href("files/a.zip", None).is_none());
    }
}
