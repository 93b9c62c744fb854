//! Camera device and stream traits

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::frame::CapturedFrame;
use crate::{MediaConstraints, MediaError};

/// Media track kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Media track ready state.
///
/// Mirrors the browser's `MediaStreamTrack.readyState`: a stopped track
/// reports `Ended` and the device indicator turns off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackState {
    Live,
    Ended,
}

/// Snapshot of one track's kind and state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackStatus {
    pub kind: TrackKind,
    pub state: TrackState,
}

/// An acquired media stream.
///
/// Handles are shared by reference ([`Arc`]) so the capture session and the
/// inference loop read the same stream instead of opening the device twice.
pub trait CameraStream: Send + Sync {
    /// Most recent decoded frame, if the feed has produced one
    fn latest_frame(&self) -> Option<CapturedFrame>;

    /// Current state of every track in the stream
    fn tracks(&self) -> Vec<TrackStatus>;

    /// Stop all tracks. Must be idempotent; dropping the handle without
    /// calling this leaves the hardware indicator on.
    fn stop(&self);

    /// Whether any track is still live
    fn is_live(&self) -> bool {
        self.tracks()
            .iter()
            .any(|t| t.state == TrackState::Live)
    }
}

/// A camera/microphone device that can be opened into a stream
pub trait CameraDevice: Send + Sync {
    /// Acquire a stream matching the constraints.
    ///
    /// Rejection (permission denied, no device) surfaces as
    /// [`MediaError::Acquisition`]; the caller decides whether to re-prompt.
    fn open(&self, constraints: &MediaConstraints) -> Result<Arc<dyn CameraStream>, MediaError>;
}
