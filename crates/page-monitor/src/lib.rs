//! Page Monitoring Primitives
//!
//! Shared vocabulary for browser-level page events plus two passive state
//! mirrors:
//! - Fullscreen tracking (is a fullscreen element active?)
//! - Tab activity tracking (is the tab the focused, visible one?)
//!
//! The trackers only mirror state; deciding whether a transition is a
//! proctoring violation belongs to the violation monitor.

pub mod event;
pub mod tracker;

pub use event::{ClipboardOp, KeyCombo, PageEvent};
pub use tracker::{FullscreenTracker, TabActivityTracker};
