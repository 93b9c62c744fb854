//! Media Capture Session
//!
//! Owns the camera/microphone stream for one proctored exam attempt:
//! - Idempotent acquire/release keyed off the exam's active flag
//! - Off-screen frame access with on-demand JPEG snapshots
//! - Periodic snapshot capture into a caller-supplied sink
//!
//! Device access sits behind the [`CameraDevice`]/[`CameraStream`] traits so
//! the session logic runs unchanged against `getUserMedia` glue or an
//! in-memory test double.

pub mod device;
pub mod frame;
pub mod session;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use device::{CameraDevice, CameraStream, TrackKind, TrackState, TrackStatus};
pub use frame::{CapturedFrame, EncodedFrame};
pub use session::{FrameSink, MediaSession, SessionConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media capture error types
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to acquire media stream: {0}")]
    Acquisition(String),

    #[error("Frame encoding failed: {0}")]
    Encode(String),

    #[error("No active media stream")]
    NotActive,
}

/// Requested stream constraints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConstraints {
    /// Request a video track
    pub video: bool,
    /// Request an audio track
    pub audio: bool,
    /// Preferred capture width
    pub width: u32,
    /// Preferred capture height
    pub height: u32,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
            width: 640,
            height: 480,
        }
    }
}

impl MediaConstraints {
    /// Video-only constraints (inference feeds)
    pub fn video_only() -> Self {
        Self {
            audio: false,
            ..Default::default()
        }
    }
}
