//! In-memory camera doubles for tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::device::{CameraDevice, CameraStream, TrackKind, TrackState, TrackStatus};
use crate::frame::CapturedFrame;
use crate::{MediaConstraints, MediaError};

/// Scripted stream whose frames and track states tests control directly
pub struct ScriptedStream {
    frame: Mutex<Option<CapturedFrame>>,
    live: AtomicBool,
    has_audio: bool,
}

impl ScriptedStream {
    pub fn new(has_audio: bool) -> Self {
        Self {
            frame: Mutex::new(None),
            live: AtomicBool::new(true),
            has_audio,
        }
    }

    /// Set the frame the feed currently shows
    pub fn set_frame(&self, frame: CapturedFrame) {
        *self.frame.lock().unwrap_or_else(|p| p.into_inner()) = Some(frame);
    }

    /// Drop the current frame (feed went dark)
    pub fn clear_frame(&self) {
        *self.frame.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

impl CameraStream for ScriptedStream {
    fn latest_frame(&self) -> Option<CapturedFrame> {
        self.frame
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn tracks(&self) -> Vec<TrackStatus> {
        let state = if self.live.load(Ordering::SeqCst) {
            TrackState::Live
        } else {
            TrackState::Ended
        };
        let mut tracks = vec![TrackStatus {
            kind: TrackKind::Video,
            state,
        }];
        if self.has_audio {
            tracks.push(TrackStatus {
                kind: TrackKind::Audio,
                state,
            });
        }
        tracks
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// Scripted device tracking every stream it opened
#[derive(Default)]
pub struct ScriptedCamera {
    failing: AtomicBool,
    opened: Mutex<Vec<Arc<ScriptedStream>>>,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent opens reject (permission denied / no device)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// How many streams were opened over this device's lifetime
    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Most recently opened stream
    pub fn last_stream(&self) -> Option<Arc<ScriptedStream>> {
        self.opened
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .last()
            .cloned()
    }

    /// Number of streams still holding a live track
    pub fn live_stream_count(&self) -> usize {
        self.opened
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .filter(|s| s.is_live())
            .count()
    }
}

impl CameraDevice for ScriptedCamera {
    fn open(&self, constraints: &MediaConstraints) -> Result<Arc<dyn CameraStream>, MediaError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MediaError::Acquisition("permission denied".into()));
        }
        let stream = Arc::new(ScriptedStream::new(constraints.audio));
        self.opened
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(stream.clone());
        Ok(stream)
    }
}
