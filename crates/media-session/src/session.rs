//! Media session lifecycle and periodic capture

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::device::{CameraDevice, CameraStream};
use crate::frame::EncodedFrame;
use crate::{MediaConstraints, MediaError};

/// Sink receiving periodic frame snapshots
pub type FrameSink = Box<dyn FnMut(EncodedFrame) + Send>;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Stream constraints requested at acquisition
    pub constraints: MediaConstraints,
    /// Interval between periodic snapshots (milliseconds)
    pub capture_interval_ms: u64,
    /// JPEG quality for snapshots (1-100)
    pub jpeg_quality: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            constraints: MediaConstraints::default(),
            capture_interval_ms: 3000,
            jpeg_quality: 60,
        }
    }
}

/// One exam attempt's media capture session.
///
/// Exactly one stream is live at a time. `set_active(true)` is idempotent;
/// `set_active(false)` stops every track and resets the session so a later
/// activation re-acquires cleanly. Teardown runs on every exit path,
/// including drop.
pub struct MediaSession {
    config: SessionConfig,
    device: Arc<dyn CameraDevice>,
    stream: Option<Arc<dyn CameraStream>>,
    initialized: bool,
    sink: Option<FrameSink>,
}

impl MediaSession {
    /// Create an inactive session over a device
    pub fn new(device: Arc<dyn CameraDevice>, config: SessionConfig) -> Self {
        Self {
            config,
            device,
            stream: None,
            initialized: false,
            sink: None,
        }
    }

    /// Install the snapshot sink
    pub fn set_frame_sink(&mut self, sink: FrameSink) {
        self.sink = Some(sink);
    }

    /// Flip the session active or inactive.
    ///
    /// Activation acquires the stream once and then no-ops until the session
    /// is released. Acquisition failure leaves the session inactive and
    /// returns the error; no retry is attempted here.
    pub fn set_active(&mut self, active: bool) -> Result<(), MediaError> {
        if !active {
            self.release();
            return Ok(());
        }

        if self.initialized {
            return Ok(());
        }

        let stream = self.device.open(&self.config.constraints).map_err(|e| {
            warn!("media acquisition failed: {}", e);
            e
        })?;

        info!(
            "media session acquired stream ({} tracks)",
            stream.tracks().len()
        );
        self.stream = Some(stream);
        self.initialized = true;
        Ok(())
    }

    /// Stop all tracks and reset; safe to call repeatedly
    pub fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
            info!("media session released");
        }
        self.initialized = false;
    }

    /// Whether the session currently holds a stream
    pub fn is_active(&self) -> bool {
        self.initialized
    }

    /// Whether the held stream still has a live track
    pub fn stream_live(&self) -> bool {
        self.stream.as_ref().map(|s| s.is_live()).unwrap_or(false)
    }

    /// Shared handle to the live stream, for co-consumers (inference loop)
    pub fn stream(&self) -> Option<Arc<dyn CameraStream>> {
        self.stream.clone()
    }

    /// Encode the current video frame as JPEG.
    ///
    /// Returns `None` when no stream is held, the feed has produced no frame
    /// yet, or the frame has no usable dimensions.
    pub fn snapshot(&self) -> Option<EncodedFrame> {
        let frame = self.stream.as_ref()?.latest_frame()?;
        if !frame.has_usable_dimensions() {
            return None;
        }
        match frame.encode_jpeg(self.config.jpeg_quality) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!("snapshot encoding failed: {}", e);
                None
            }
        }
    }

    /// Run one periodic capture step: snapshot the feed into the sink
    pub fn capture_tick(&mut self) {
        if !self.initialized {
            return;
        }
        if let Some(encoded) = self.snapshot() {
            debug!("captured {} byte snapshot", encoded.bytes.len());
            if let Some(sink) = self.sink.as_mut() {
                sink(encoded);
            }
        }
    }

    /// Drive [`capture_tick`](Self::capture_tick) on the configured interval
    /// until the session goes inactive.
    pub async fn run_capture_loop(session: Arc<Mutex<MediaSession>>) {
        let interval = {
            let guard = session.lock().unwrap_or_else(|p| p.into_inner());
            Duration::from_millis(guard.config.capture_interval_ms)
        };
        info!("starting capture loop at {:?} cadence", interval);

        loop {
            tokio::time::sleep(interval).await;
            let mut guard = session.lock().unwrap_or_else(|p| p.into_inner());
            if !guard.is_active() {
                debug!("capture loop stopping: session inactive");
                break;
            }
            guard.capture_tick();
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ScriptedCamera, ScriptedStream};
    use crate::TrackState;

    fn frame_4x4(ts: u64) -> crate::CapturedFrame {
        crate::CapturedFrame::new(vec![128; 4 * 4 * 3], 4, 4, ts, 0)
    }

    #[test]
    fn test_activation_is_idempotent() {
        let camera = Arc::new(ScriptedCamera::new());
        let mut session = MediaSession::new(camera.clone(), SessionConfig::default());

        session.set_active(true).unwrap();
        session.set_active(true).unwrap();
        assert_eq!(camera.open_count(), 1);
        assert!(session.is_active());
    }

    #[test]
    fn test_release_stops_every_track_and_reacquires() {
        let camera = Arc::new(ScriptedCamera::new());
        let mut session = MediaSession::new(camera.clone(), SessionConfig::default());

        // start → stop → start → stop
        session.set_active(true).unwrap();
        let first = camera.last_stream().unwrap();
        session.set_active(false).unwrap();
        session.set_active(true).unwrap();
        let second = camera.last_stream().unwrap();
        session.set_active(false).unwrap();

        assert_eq!(camera.open_count(), 2);
        for stream in [first, second] {
            assert!(stream
                .tracks()
                .iter()
                .all(|t| t.state == TrackState::Ended));
        }
        assert!(!session.is_active());
    }

    #[test]
    fn test_drop_releases_stream() {
        let camera = Arc::new(ScriptedCamera::new());
        {
            let mut session = MediaSession::new(camera.clone(), SessionConfig::default());
            session.set_active(true).unwrap();
        }
        let stream = camera.last_stream().unwrap();
        assert!(!stream.is_live());
    }

    #[test]
    fn test_acquisition_failure_surfaces() {
        let camera = Arc::new(ScriptedCamera::new());
        camera.set_failing(true);

        let mut session = MediaSession::new(camera, SessionConfig::default());
        let err = session.set_active(true).unwrap_err();
        assert!(matches!(err, MediaError::Acquisition(_)));
        assert!(!session.is_active());
    }

    #[test]
    fn test_snapshot_requires_usable_frame() {
        let camera = Arc::new(ScriptedCamera::new());
        let mut session = MediaSession::new(camera.clone(), SessionConfig::default());
        session.set_active(true).unwrap();

        // No frame produced yet
        assert!(session.snapshot().is_none());

        // Zero-dimension frame (video element still negotiating)
        let stream = camera.last_stream().unwrap();
        stream.set_frame(crate::CapturedFrame::default());
        assert!(session.snapshot().is_none());

        stream.set_frame(frame_4x4(10));
        let snap = session.snapshot().unwrap();
        assert_eq!(snap.timestamp_ms, 10);
    }

    #[test]
    fn test_capture_tick_feeds_sink() {
        let camera = Arc::new(ScriptedCamera::new());
        let mut session = MediaSession::new(camera.clone(), SessionConfig::default());

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink_log = captured.clone();
        session.set_frame_sink(Box::new(move |frame| {
            sink_log.lock().unwrap().push(frame.timestamp_ms);
        }));

        session.set_active(true).unwrap();
        camera.last_stream().unwrap().set_frame(frame_4x4(42));

        session.capture_tick();
        session.capture_tick();
        assert_eq!(*captured.lock().unwrap(), vec![42, 42]);

        // Inactive sessions capture nothing
        session.set_active(false).unwrap();
        session.capture_tick();
        assert_eq!(captured.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_capture_loop_stops_when_inactive() {
        let camera = Arc::new(ScriptedCamera::new());
        let config = SessionConfig {
            capture_interval_ms: 5,
            ..Default::default()
        };
        let mut session = MediaSession::new(camera.clone(), config);

        let captured = Arc::new(Mutex::new(0u32));
        let sink_log = captured.clone();
        session.set_frame_sink(Box::new(move |_| {
            *sink_log.lock().unwrap() += 1;
        }));
        session.set_active(true).unwrap();
        camera.last_stream().unwrap().set_frame(frame_4x4(1));

        let shared = Arc::new(Mutex::new(session));
        let looper = tokio::spawn(MediaSession::run_capture_loop(shared.clone()));

        tokio::time::sleep(Duration::from_millis(40)).await;
        shared.lock().unwrap().set_active(false).unwrap();
        looper.await.unwrap();

        assert!(*captured.lock().unwrap() > 0);
    }

    #[test]
    fn test_scripted_stream_audio_track() {
        let stream = ScriptedStream::new(true);
        assert_eq!(stream.tracks().len(), 2);
        stream.stop();
        stream.stop();
        assert!(!stream.is_live());
    }
}
