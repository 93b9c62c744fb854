//! Frame Inference Loop
//!
//! Drives a strictly-sequential per-frame detection cycle against the live
//! video feed once both the camera stream and the classifier are ready.
//! Each cycle hands the caller the detection result plus an on-demand
//! snapshot function that always reads the *current* frame.
//!
//! Scheduling goes through the [`FrameTicker`] abstraction: a tokio
//! interval in production, a manual ticker in tests. The loop stops the
//! instant the exam deactivates, the classifier becomes unready, or the
//! stream loses its last live track.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use media_session::{CameraStream, EncodedFrame};
use vision_classifier::{ClassifierLoader, DetectionResult};

/// Callback receiving each detection result and a lazy snapshot function
pub type DetectionCallback =
    Box<dyn FnMut(&DetectionResult, &dyn Fn() -> Option<EncodedFrame>) + Send>;

/// Loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Target time between detection cycles (milliseconds, ~15 fps default)
    pub frame_interval_ms: u64,
    /// JPEG quality for on-demand snapshots
    pub snapshot_quality: u8,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 66,
            snapshot_quality: 60,
        }
    }
}

impl LoopConfig {
    /// Production ticker at the configured frame cadence
    pub fn ticker(&self) -> IntervalTicker {
        IntervalTicker::new(Duration::from_millis(self.frame_interval_ms))
    }
}

/// "Schedule the next unit of work" abstraction over frame timing
pub trait FrameTicker: Send {
    /// Resolve when the next frame slot is available
    fn next_frame(&mut self) -> impl std::future::Future<Output = ()> + Send;
}

/// Tokio interval ticker for production use
pub struct IntervalTicker {
    interval: tokio::time::Interval,
}

impl IntervalTicker {
    pub fn new(frame_interval: Duration) -> Self {
        let mut interval = tokio::time::interval(frame_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        Self { interval }
    }
}

impl FrameTicker for IntervalTicker {
    fn next_frame(&mut self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            self.interval.tick().await;
        }
    }
}

/// Per-frame detection driver.
///
/// Borrows the stream by shared handle; the media session that opened it
/// keeps ownership and remains responsible for stopping the tracks.
pub struct InferenceLoop {
    config: LoopConfig,
    stream: Arc<dyn CameraStream>,
    loader: ClassifierLoader,
    callback: DetectionCallback,
    active: bool,
    last_timestamp_ms: u64,
    cycles: u64,
}

impl InferenceLoop {
    /// Create an active loop over a shared stream and classifier
    pub fn new(
        stream: Arc<dyn CameraStream>,
        loader: ClassifierLoader,
        callback: DetectionCallback,
        config: LoopConfig,
    ) -> Self {
        Self {
            config,
            stream,
            loader,
            callback,
            active: true,
            last_timestamp_ms: 0,
            cycles: 0,
        }
    }

    /// Flip the exam-active flag
    pub fn set_active(&mut self, active: bool) {
        if self.active && !active {
            debug!("inference loop deactivated after {} cycles", self.cycles);
        }
        self.active = active;
    }

    /// Whether a cycle would run right now
    pub fn running(&self) -> bool {
        self.active && self.loader.ready() && self.stream.is_live()
    }

    /// Detection cycles completed so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one detection cycle at the given monotonic time.
    ///
    /// Returns `true` when a detection was issued. Skips (without error)
    /// when the loop is not running or the current frame has no usable
    /// dimensions. Timestamps handed to the classifier are strictly
    /// increasing across issued detections.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if !self.running() {
            return false;
        }

        let frame = match self.stream.latest_frame() {
            Some(frame) if frame.has_usable_dimensions() => frame,
            _ => return false,
        };

        let timestamp_ms = if self.cycles > 0 && now_ms <= self.last_timestamp_ms {
            self.last_timestamp_ms + 1
        } else {
            now_ms
        };

        let result = match self.loader.detect(&frame, timestamp_ms) {
            Some(Ok(result)) => result,
            Some(Err(e)) => {
                warn!("detection cycle failed: {}", e);
                return false;
            }
            None => return false,
        };

        let stream = Arc::clone(&self.stream);
        let quality = self.config.snapshot_quality;
        let snapshot = move || snapshot_current(stream.as_ref(), quality);
        (self.callback)(&result, &snapshot);

        self.last_timestamp_ms = timestamp_ms;
        self.cycles += 1;
        true
    }

    /// Drive ticks on a frame ticker until the loop stops.
    ///
    /// Cycles are strictly sequential: each waits for the prior tick before
    /// issuing the next detection.
    pub async fn run(shared: Arc<Mutex<InferenceLoop>>, mut ticker: impl FrameTicker) {
        info!("inference loop starting");
        let origin = Instant::now();
        loop {
            ticker.next_frame().await;
            let mut guard = shared.lock().unwrap_or_else(|p| p.into_inner());
            if !guard.running() {
                info!("inference loop stopping after {} cycles", guard.cycles);
                break;
            }
            guard.tick(origin.elapsed().as_millis() as u64);
        }
    }
}

/// Encode the stream's current frame; `None` without usable dimensions
fn snapshot_current(stream: &dyn CameraStream, quality: u8) -> Option<EncodedFrame> {
    let frame = stream.latest_frame()?;
    if !frame.has_usable_dimensions() {
        return None;
    }
    frame.encode_jpeg(quality).ok()
}
