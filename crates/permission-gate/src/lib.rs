//! Permission Gates
//!
//! Mirrors browser permission state for media devices into reactive booleans:
//! - Per-device gates (camera, microphone)
//! - Combined camera+microphone gate
//! - Subscription lifecycle with idempotent teardown
//!
//! Gates are passive status mirrors: a backend failure downgrades access to
//! `false` and is logged, never propagated into the host.

pub mod backend;
pub mod gate;

pub use backend::{PermissionBackend, PermissionListener, PermissionWatch};
pub use gate::{MediaPermissions, PermissionGate};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permission error types
#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("Permission API unsupported: {0}")]
    Unsupported(String),

    #[error("Permission query failed: {0}")]
    Query(String),

    #[error("Permission subscription failed: {0}")]
    Subscribe(String),
}

/// Media device kind a permission applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaDeviceKind {
    Camera,
    Microphone,
}

impl MediaDeviceKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaDeviceKind::Camera => "camera",
            MediaDeviceKind::Microphone => "microphone",
        }
    }
}

/// Permission state as reported by the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    #[default]
    Unknown,
}

impl PermissionState {
    /// Whether this state allows device access
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}
