//! Violation record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Violation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Violation category.
///
/// Right-click reuses `TabSwitch` (the category the upstream recording
/// system already knows for generic focus/interaction violations); the
/// description string carries the actual cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    TabSwitch,
    CopyPaste,
    FaceNotVisible,
    MultipleFaces,
    Timeout,
}

impl ViolationKind {
    /// Get string representation (wire format used by the recording sink)
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::TabSwitch => "tab-switch",
            ViolationKind::CopyPaste => "copy-paste",
            ViolationKind::FaceNotVisible => "face-not-visible",
            ViolationKind::MultipleFaces => "multiple-faces",
            ViolationKind::Timeout => "timeout",
        }
    }
}

/// One recorded violation.
///
/// Created inside the event handler the instant a condition fires and never
/// mutated afterwards; the fields are public for reading, and no mutators
/// exist. `timestamp` serializes as ISO-8601.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Per-record id
    pub id: Uuid,
    /// Exam attempt being monitored (caller-supplied)
    pub attempt_id: String,
    /// Violation category
    pub kind: ViolationKind,
    /// Human-readable detail
    pub description: String,
    /// Severity
    pub severity: Severity,
    /// Detection time, set once at creation
    pub timestamp: DateTime<Utc>,
}

impl ViolationRecord {
    /// Create a record stamped with the current time
    pub fn new(
        attempt_id: impl Into<String>,
        kind: ViolationKind,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            attempt_id: attempt_id.into(),
            kind,
            description: description.into(),
            severity,
            timestamp: Utc::now(),
        }
    }
}
