//! Page event types

use serde::{Deserialize, Serialize};

/// Clipboard operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipboardOp {
    Copy,
    Paste,
    Cut,
}

impl ClipboardOp {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipboardOp::Copy => "copy",
            ClipboardOp::Paste => "paste",
            ClipboardOp::Cut => "cut",
        }
    }
}

/// A keyboard combination as reported by the host page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCombo {
    /// Key value (e.g. "c", "F12", "Escape")
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    /// Command key on macOS
    pub meta: bool,
}

impl KeyCombo {
    /// Plain key press with no modifiers
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        }
    }

    /// Ctrl + key
    pub fn ctrl(key: &str) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    /// Ctrl + Shift + key
    pub fn ctrl_shift(key: &str) -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::plain(key)
        }
    }

    /// Meta (Cmd) + key
    pub fn meta(key: &str) -> Self {
        Self {
            meta: true,
            ..Self::plain(key)
        }
    }

    /// Key value normalized to lowercase for matching
    pub fn key_lower(&self) -> String {
        self.key.to_lowercase()
    }

    /// Human-readable label, e.g. "Ctrl+Shift+I"
    pub fn label(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(5);
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            parts.push("Meta");
        }
        let key = if self.key.chars().count() == 1 {
            self.key.to_uppercase()
        } else {
            self.key.clone()
        };
        parts.push(&key);
        parts.join("+")
    }
}

/// A browser-level event forwarded into the proctoring pipeline.
///
/// The host page translates raw DOM events into this enum and feeds them to
/// the trackers and the violation monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageEvent {
    /// Document visibility flipped (hidden = tab switched or minimized)
    VisibilityChanged { hidden: bool },
    /// Window lost focus
    WindowBlurred,
    /// Window regained focus
    WindowFocused,
    /// Fullscreen element appeared or disappeared
    FullscreenChanged { fullscreen: bool },
    /// Clipboard operation attempted
    Clipboard(ClipboardOp),
    /// Right-click context menu requested
    ContextMenu,
    /// Key pressed
    KeyDown(KeyCombo),
    /// Mouse pointer moved
    PointerMoved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_labels() {
        assert_eq!(KeyCombo::ctrl("c").label(), "Ctrl+C");
        assert_eq!(KeyCombo::ctrl_shift("i").label(), "Ctrl+Shift+I");
        assert_eq!(KeyCombo::plain("F12").label(), "F12");
        assert_eq!(KeyCombo::meta("a").label(), "Meta+A");
    }

    #[test]
    fn test_event_roundtrip() {
        let event = PageEvent::Clipboard(ClipboardOp::Paste);
        let json = serde_json::to_string(&event).unwrap();
        let back: PageEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
