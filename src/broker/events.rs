//! Events the host feeds into the broker.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::host::DomElement;

/// Host identifier of a native browser download.
pub type DownloadId = u64;

/// Kind of an incoming event, used to route it and to label logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Submit,
    DownloadCreated,
    ContextMenu,
    IconClick,
}

impl EventKind {
    /// Returns the stable label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Submit => "submit",
            Self::DownloadCreated => "download-created",
            Self::ContextMenu => "context-menu",
            Self::IconClick => "icon-click",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modifier key that bypasses the broker for a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifierKey {
    #[default]
    Alt,
    Ctrl,
    Shift,
    Meta,
}

impl ModifierKey {
    /// Returns the stable config label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alt => "alt",
            Self::Ctrl => "ctrl",
            Self::Shift => "shift",
            Self::Meta => "meta",
        }
    }
}

impl FromStr for ModifierKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "alt" => Ok(Self::Alt),
            "ctrl" | "control" => Ok(Self::Ctrl),
            "shift" => Ok(Self::Shift),
            "meta" | "cmd" | "super" => Ok(Self::Meta),
            other => Err(format!(
                "unknown modifier '{other}' (expected alt, ctrl, shift or meta)"
            )),
        }
    }
}

/// Modifier keys held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Only `key` held.
    #[must_use]
    pub fn only(key: ModifierKey) -> Self {
        let mut modifiers = Self::default();
        match key {
            ModifierKey::Alt => modifiers.alt = true,
            ModifierKey::Ctrl => modifiers.ctrl = true,
            ModifierKey::Shift => modifiers.shift = true,
            ModifierKey::Meta => modifiers.meta = true,
        }
        modifiers
    }

    /// Whether `key` was held.
    #[must_use]
    pub fn is_held(self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Alt => self.alt,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Shift => self.shift,
            ModifierKey::Meta => self.meta,
        }
    }
}

/// A click somewhere in the page.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    /// The element the click landed on (not necessarily the link itself).
    pub target: Arc<dyn DomElement>,
    pub modifiers: Modifiers,
}

/// A form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitEvent {
    /// The form's `action` URL, possibly relative.
    pub action: String,
    /// Submitted button or form label, possibly empty.
    pub label: String,
}

/// Events observed at page level.
#[derive(Debug, Clone)]
pub enum PageEvent {
    Click(ClickEvent),
    Submit(SubmitEvent),
}

impl PageEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Click(_) => EventKind::Click,
            Self::Submit(_) => EventKind::Submit,
        }
    }
}

/// A download the browser has already started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeDownload {
    pub id: DownloadId,
    pub url: String,
    /// Browser-chosen filename or full target path, if known yet.
    pub filename: Option<String>,
}

/// The "send this link" context-menu action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenuClick {
    pub link_url: String,
}

/// Events observed at browser level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    DownloadCreated(NativeDownload),
    ContextMenu(ContextMenuClick),
    IconClick,
}

impl BrowserEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DownloadCreated(_) => EventKind::DownloadCreated,
            Self::ContextMenu(_) => EventKind::ContextMenu,
            Self::IconClick => EventKind::IconClick,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_key_parse() {
        assert_eq!("Alt".parse::<ModifierKey>().unwrap(), ModifierKey::Alt);
        assert_eq!("control".parse::<ModifierKey>().unwrap(), ModifierKey::Ctrl);
        assert_eq!("cmd".parse::<ModifierKey>().unwrap(), ModifierKey::Meta);
        assert!("hyper".parse::<ModifierKey>().is_err());
    }

    #[test]
    fn test_modifiers_only_and_is_held() {
        let modifiers = Modifiers::only(ModifierKey::Shift);
        assert!(modifiers.is_held(ModifierKey::Shift));
        assert!(!modifiers.is_held(ModifierKey::Alt));
        assert!(!Modifiers::default().is_held(ModifierKey::Alt));
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(BrowserEvent::IconClick.kind(), EventKind::IconClick);
        let submit = PageEvent::Submit(SubmitEvent {
            action: "/export".to_string(),
            label: String::new(),
        });
        assert_eq!(submit.kind().to_string(), "submit");
    }
}
