//! Fullscreen and tab-activity state mirrors

use tracing::debug;

use crate::event::PageEvent;

/// Mirrors whether the document currently has a fullscreen element.
///
/// Pure state mirror: it reacts to fullscreen-change events and an initial
/// seed at mount, nothing else.
#[derive(Debug, Default)]
pub struct FullscreenTracker {
    fullscreen: bool,
}

impl FullscreenTracker {
    /// Create a tracker seeded with the current fullscreen state
    pub fn new(fullscreen: bool) -> Self {
        Self { fullscreen }
    }

    /// Update from a page event
    pub fn observe(&mut self, event: &PageEvent) {
        if let PageEvent::FullscreenChanged { fullscreen } = event {
            if *fullscreen != self.fullscreen {
                debug!("fullscreen state changed: {}", fullscreen);
            }
            self.fullscreen = *fullscreen;
        }
    }

    /// Whether a fullscreen element is currently active
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

/// Mirrors whether the tab is the active, visible one.
///
/// Reports `true` from [`is_backgrounded`](Self::is_backgrounded) when the
/// document is hidden or the window has lost focus.
#[derive(Debug, Default)]
pub struct TabActivityTracker {
    hidden: bool,
    blurred: bool,
}

impl TabActivityTracker {
    /// Create a tracker for a visible, focused tab
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from a page event
    pub fn observe(&mut self, event: &PageEvent) {
        match event {
            PageEvent::VisibilityChanged { hidden } => {
                if *hidden != self.hidden {
                    debug!("document visibility changed: hidden={}", hidden);
                }
                self.hidden = *hidden;
            }
            PageEvent::WindowBlurred => self.blurred = true,
            PageEvent::WindowFocused => self.blurred = false,
            _ => {}
        }
    }

    /// Whether the tab is NOT the active, visible one
    pub fn is_backgrounded(&self) -> bool {
        self.hidden || self.blurred
    }

    /// Whether the document itself is hidden
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ClipboardOp;

    #[test]
    fn test_fullscreen_mirror() {
        let mut tracker = FullscreenTracker::new(false);
        assert!(!tracker.is_fullscreen());

        tracker.observe(&PageEvent::FullscreenChanged { fullscreen: true });
        assert!(tracker.is_fullscreen());

        // Unrelated events leave the state alone
        tracker.observe(&PageEvent::PointerMoved);
        assert!(tracker.is_fullscreen());

        tracker.observe(&PageEvent::FullscreenChanged { fullscreen: false });
        assert!(!tracker.is_fullscreen());
    }

    #[test]
    fn test_tab_activity_visibility() {
        let mut tracker = TabActivityTracker::new();
        assert!(!tracker.is_backgrounded());

        tracker.observe(&PageEvent::VisibilityChanged { hidden: true });
        assert!(tracker.is_backgrounded());
        assert!(tracker.is_hidden());

        tracker.observe(&PageEvent::VisibilityChanged { hidden: false });
        assert!(!tracker.is_backgrounded());
    }

    #[test]
    fn test_tab_activity_blur_focus() {
        let mut tracker = TabActivityTracker::new();

        tracker.observe(&PageEvent::WindowBlurred);
        assert!(tracker.is_backgrounded());
        assert!(!tracker.is_hidden());

        tracker.observe(&PageEvent::WindowFocused);
        assert!(!tracker.is_backgrounded());
    }

    #[test]
    fn test_trackers_ignore_clipboard() {
        let mut tracker = TabActivityTracker::new();
        tracker.observe(&PageEvent::Clipboard(ClipboardOp::Copy));
        assert!(!tracker.is_backgrounded());
    }
}
