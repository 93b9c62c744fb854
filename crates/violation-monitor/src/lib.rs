//! Violation Monitor
//!
//! The proctoring orchestrator for one exam attempt:
//! - Classifies page events (tab switches, clipboard use, right-clicks,
//!   blocked keyboard shortcuts) into typed violation records
//! - Tracks mouse inactivity on a periodic poll
//! - Turns media-acquisition failures, permission revocations, and
//!   detection results (no face / multiple faces) into violations
//! - Keeps the append-only in-session violation list, feeds the external
//!   recording sink synchronously, and drives a queued alert UI
//!
//! Violations are immutable once created and emitted in the order their
//! triggering events arrive. No detector failure escapes the monitor; each
//! condition degrades independently.

pub mod keymap;
pub mod monitor;
pub mod violation;

pub use keymap::blocked_combo;
pub use monitor::{EventOutcome, MonitorConfig, ProctorMonitor, ViolationSink};
pub use violation::{Severity, ViolationKind, ViolationRecord};
