//! Filename patterns that mark a URL or link label as a download.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Extensions treated as archives and installers.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[
    "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "deb", "rpm", "dmg", "exe", "msi", "bin", "iso",
    "img",
];

/// Extensions treated as office documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// Extensions treated as audio and video.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "mp3", "wav", "flac", "aac",
];

/// Extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg", "webp"];

#[allow(clippy::expect_used)]
static DOWNLOAD_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)download").expect("download regex is valid")); // Static pattern, safe to panic

static ARCHIVE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| suffix_regex(ARCHIVE_EXTENSIONS));
static DOCUMENT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| suffix_regex(DOCUMENT_EXTENSIONS));
static MEDIA_SUFFIX: LazyLock<Regex> = LazyLock::new(|| suffix_regex(MEDIA_EXTENSIONS));
static IMAGE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| suffix_regex(IMAGE_EXTENSIONS));

#[allow(clippy::expect_used)]
fn suffix_regex(extensions: &[&str]) -> Regex {
    let alternation = extensions
        .iter()
        .map(|ext| regex::escape(ext))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\.(?:{alternation})$")).expect("extension regex is valid") // Built from static lists, safe to panic
}

/// Extension group a suffix match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileGroup {
    Archive,
    Document,
    Media,
    Image,
}

impl FileGroup {
    /// Returns the stable label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Document => "document",
            Self::Media => "media",
            Self::Image => "image",
        }
    }
}

/// Which rule matched a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMatch {
    /// The value contains the word "download".
    DownloadWord,
    /// The value ends with a registered extension.
    Extension(FileGroup),
}

impl fmt::Display for PatternMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DownloadWord => f.write_str("download-word"),
            Self::Extension(group) => write!(f, "{}-extension", group.as_str()),
        }
    }
}

/// Matches a single value (URL, URL path or label) against the pattern rules.
///
/// Rules are tried in a fixed order and the first hit is returned.
#[must_use]
pub fn match_value(value: &str) -> Option<PatternMatch> {
    if value.is_empty() {
        return None;
    }
    if DOWNLOAD_WORD.is_match(value) {
        return Some(PatternMatch::DownloadWord);
    }
    let groups: [(&Regex, FileGroup); 4] = [
        (&*ARCHIVE_SUFFIX, FileGroup::Archive),
        (&*DOCUMENT_SUFFIX, FileGroup::Document),
        (&*MEDIA_SUFFIX, FileGroup::Media),
        (&*IMAGE_SUFFIX, FileGroup::Image),
    ];
    groups
        .into_iter()
        .find(|(pattern, _)| pattern.is_match(value))
        .map(|(_, group)| PatternMatch::Extension(group))
}
