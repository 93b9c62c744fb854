//! Proctoring orchestrator

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use media_session::MediaSession;
use page_monitor::{FullscreenTracker, PageEvent, TabActivityTracker};
use permission_gate::MediaPermissions;
use serde::{Deserialize, Serialize};
use vision_classifier::DetectionResult;

use crate::keymap::blocked_combo;
use crate::violation::{Severity, ViolationKind, ViolationRecord};

/// External recording sink, invoked synchronously for every violation
pub type ViolationSink = Box<dyn FnMut(&ViolationRecord) + Send>;

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Mouse inactivity threshold before a timeout violation (milliseconds)
    pub inactivity_threshold_ms: u64,
    /// Cadence of the inactivity poll (milliseconds)
    pub inactivity_poll_ms: u64,
    /// Consecutive no-face frames before a face-not-visible violation
    pub no_face_debounce_frames: u32,
    /// Consecutive multi-face frames before a multiple-faces violation
    pub multi_face_debounce_frames: u32,
    /// Minimum spacing between detection-driven violations of one kind
    /// (milliseconds)
    pub detection_cooldown_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold_ms: 120_000,
            inactivity_poll_ms: 30_000,
            no_face_debounce_frames: 30,
            multi_face_debounce_frames: 5,
            detection_cooldown_ms: 30_000,
        }
    }
}

impl MonitorConfig {
    /// Stricter thresholds (shorter grace periods)
    pub fn strict() -> Self {
        Self {
            inactivity_threshold_ms: 60_000,
            inactivity_poll_ms: 15_000,
            no_face_debounce_frames: 15,
            multi_face_debounce_frames: 3,
            detection_cooldown_ms: 15_000,
        }
    }
}

/// What the host page should do with the event that was just handled
#[derive(Debug, Clone)]
pub struct EventOutcome {
    /// Call `preventDefault()` on the underlying DOM event
    pub block_default: bool,
    /// Violation emitted for this event, if any
    pub violation: Option<ViolationRecord>,
}

impl EventOutcome {
    fn pass() -> Self {
        Self {
            block_default: false,
            violation: None,
        }
    }
}

/// Event-driven violation aggregator for one exam attempt.
///
/// All mutable state lives here and is touched only through these methods;
/// the host drives it from UI-thread callbacks. Detection is gated on
/// [`start`](Self::start)/[`stop`](Self::stop); the stop path also releases
/// the attached media session.
pub struct ProctorMonitor {
    attempt_id: String,
    config: MonitorConfig,
    started: bool,
    sink: Option<ViolationSink>,
    violations: Vec<ViolationRecord>,
    alerts: VecDeque<ViolationRecord>,
    tab: TabActivityTracker,
    fullscreen: FullscreenTracker,
    media: Option<MediaSession>,
    last_pointer_move: Option<Instant>,
    camera_granted: Option<bool>,
    microphone_granted: Option<bool>,
    no_face_frames: u32,
    multi_face_frames: u32,
    last_detection_emit: HashMap<ViolationKind, Instant>,
}

impl ProctorMonitor {
    /// Create a monitor for one exam attempt
    pub fn new(attempt_id: impl Into<String>, config: MonitorConfig) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            config,
            started: false,
            sink: None,
            violations: Vec::new(),
            alerts: VecDeque::new(),
            tab: TabActivityTracker::new(),
            fullscreen: FullscreenTracker::default(),
            media: None,
            last_pointer_move: None,
            camera_granted: None,
            microphone_granted: None,
            no_face_frames: 0,
            multi_face_frames: 0,
            last_detection_emit: HashMap::new(),
        }
    }

    /// Install the external recording sink
    pub fn set_sink(&mut self, sink: ViolationSink) {
        self.sink = Some(sink);
    }

    /// Attach the media capture session this monitor controls
    pub fn attach_media(&mut self, session: MediaSession) {
        self.media = Some(session);
    }

    /// Begin monitoring; the inactivity clock starts at `now`
    pub fn start(&mut self, now: Instant) {
        info!("proctoring started for attempt {}", self.attempt_id);
        self.started = true;
        self.last_pointer_move = Some(now);
    }

    /// Stop monitoring and release the media session; idempotent
    pub fn stop(&mut self) {
        if self.started {
            info!(
                "proctoring stopped for attempt {} ({} violations)",
                self.attempt_id,
                self.violations.len()
            );
        }
        self.started = false;
        if let Some(media) = self.media.as_mut() {
            media.release();
        }
    }

    /// Whether monitoring is active
    pub fn started(&self) -> bool {
        self.started
    }

    /// Whether the tab is NOT the active, visible one
    pub fn tab_backgrounded(&self) -> bool {
        self.tab.is_backgrounded()
    }

    /// Whether the document is fullscreen
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_fullscreen()
    }

    /// Whether the attached media session holds a live stream
    pub fn camera_active(&self) -> bool {
        self.media.as_ref().map(|m| m.stream_live()).unwrap_or(false)
    }

    /// Flip the exam-active flag on the attached media session.
    ///
    /// An acquisition failure is recorded as a high-severity violation (the
    /// listeners keep working regardless). Returns whether the session holds
    /// a stream afterwards.
    pub fn set_active(&mut self, active: bool) -> bool {
        let Some(media) = self.media.as_mut() else {
            return false;
        };
        match media.set_active(active) {
            Ok(()) => media.is_active(),
            Err(e) => {
                warn!("media activation failed: {}", e);
                self.emit(
                    ViolationKind::FaceNotVisible,
                    Severity::High,
                    "failed to access camera or microphone".to_string(),
                );
                false
            }
        }
    }

    /// Handle one page event at the given monotonic time.
    ///
    /// Trackers update regardless; violations and default-action blocking
    /// apply only while monitoring is started.
    pub fn handle_event(&mut self, event: &PageEvent, now: Instant) -> EventOutcome {
        self.tab.observe(event);
        self.fullscreen.observe(event);

        if !self.started {
            return EventOutcome::pass();
        }

        match event {
            PageEvent::VisibilityChanged { hidden: true } => {
                let violation = self.emit(
                    ViolationKind::TabSwitch,
                    Severity::Medium,
                    "student switched tabs or minimized the window".to_string(),
                );
                EventOutcome {
                    block_default: false,
                    violation: Some(violation),
                }
            }
            PageEvent::Clipboard(op) => {
                let violation = self.emit(
                    ViolationKind::CopyPaste,
                    Severity::High,
                    format!("{} attempt blocked", op.as_str()),
                );
                EventOutcome {
                    block_default: true,
                    violation: Some(violation),
                }
            }
            PageEvent::ContextMenu => {
                let violation = self.emit(
                    ViolationKind::TabSwitch,
                    Severity::Medium,
                    "right-click context menu blocked".to_string(),
                );
                EventOutcome {
                    block_default: true,
                    violation: Some(violation),
                }
            }
            PageEvent::KeyDown(combo) => match blocked_combo(combo) {
                Some(label) => {
                    let violation = self.emit(
                        ViolationKind::CopyPaste,
                        Severity::High,
                        format!("blocked keyboard shortcut {}", label),
                    );
                    EventOutcome {
                        block_default: true,
                        violation: Some(violation),
                    }
                }
                None => EventOutcome::pass(),
            },
            PageEvent::PointerMoved => {
                self.last_pointer_move = Some(now);
                EventOutcome::pass()
            }
            _ => EventOutcome::pass(),
        }
    }

    /// Run one inactivity check.
    ///
    /// Emits one `Timeout` violation per poll at which the time since the
    /// last pointer move exceeds the threshold; the inactivity clock is not
    /// reset, so a still mouse keeps producing one violation per poll.
    pub fn poll_inactivity(&mut self, now: Instant) -> Option<ViolationRecord> {
        if !self.started {
            return None;
        }
        let last = self.last_pointer_move?;
        let idle = now.saturating_duration_since(last);
        if idle < Duration::from_millis(self.config.inactivity_threshold_ms) {
            return None;
        }
        Some(self.emit(
            ViolationKind::Timeout,
            Severity::Medium,
            format!("no mouse activity for {} seconds", idle.as_secs()),
        ))
    }

    /// Drive [`poll_inactivity`](Self::poll_inactivity) on the configured
    /// cadence until monitoring stops.
    pub async fn run_inactivity_loop(shared: Arc<Mutex<ProctorMonitor>>) {
        let poll = {
            let guard = shared.lock().unwrap_or_else(|p| p.into_inner());
            Duration::from_millis(guard.config.inactivity_poll_ms)
        };
        loop {
            tokio::time::sleep(poll).await;
            let mut guard = shared.lock().unwrap_or_else(|p| p.into_inner());
            if !guard.started {
                break;
            }
            guard.poll_inactivity(Instant::now());
        }
    }

    /// Feed the current permission booleans.
    ///
    /// A granted → revoked transition on either device is a high-severity
    /// violation; anything else just updates the mirrored state.
    pub fn update_permissions(&mut self, camera: bool, microphone: bool) {
        let revoked = self.camera_granted == Some(true) && !camera
            || self.microphone_granted == Some(true) && !microphone;
        self.camera_granted = Some(camera);
        self.microphone_granted = Some(microphone);

        if revoked && self.started {
            self.emit(
                ViolationKind::FaceNotVisible,
                Severity::High,
                "camera or microphone access was revoked".to_string(),
            );
        }
    }

    /// Convenience wiring from the permission gates
    pub fn sync_permissions(&mut self, permissions: &MediaPermissions) {
        self.update_permissions(
            permissions.has_camera_access(),
            permissions.has_microphone_access(),
        );
    }

    /// Feed one detection result from the inference loop.
    ///
    /// Debounced by consecutive-frame counts plus a per-kind cooldown so a
    /// sustained condition yields one violation per episode, not one per
    /// frame.
    pub fn ingest_detection(&mut self, result: &DetectionResult, now: Instant) {
        if !self.started {
            return;
        }

        match result.face_count() {
            0 => {
                self.no_face_frames += 1;
                self.multi_face_frames = 0;
                if self.no_face_frames >= self.config.no_face_debounce_frames
                    && self.detection_cooldown_over(ViolationKind::FaceNotVisible, now)
                {
                    self.no_face_frames = 0;
                    self.last_detection_emit
                        .insert(ViolationKind::FaceNotVisible, now);
                    self.emit(
                        ViolationKind::FaceNotVisible,
                        Severity::Medium,
                        "no face visible in the camera feed".to_string(),
                    );
                }
            }
            1 => {
                self.no_face_frames = 0;
                self.multi_face_frames = 0;
            }
            faces => {
                self.multi_face_frames += 1;
                self.no_face_frames = 0;
                if self.multi_face_frames >= self.config.multi_face_debounce_frames
                    && self.detection_cooldown_over(ViolationKind::MultipleFaces, now)
                {
                    self.multi_face_frames = 0;
                    self.last_detection_emit
                        .insert(ViolationKind::MultipleFaces, now);
                    self.emit(
                        ViolationKind::MultipleFaces,
                        Severity::High,
                        format!("{} faces detected in the camera feed", faces),
                    );
                }
            }
        }
    }

    fn detection_cooldown_over(&self, kind: ViolationKind, now: Instant) -> bool {
        match self.last_detection_emit.get(&kind) {
            Some(last) => {
                now.saturating_duration_since(*last)
                    >= Duration::from_millis(self.config.detection_cooldown_ms)
            }
            None => true,
        }
    }

    /// Ordered, append-only list of this session's violations
    pub fn violations(&self) -> &[ViolationRecord] {
        &self.violations
    }

    /// Oldest unacknowledged alert, if any.
    ///
    /// New violations queue behind it; [`acknowledge_alert`](Self::acknowledge_alert)
    /// dismisses the head and surfaces the next.
    pub fn current_alert(&self) -> Option<&ViolationRecord> {
        self.alerts.front()
    }

    /// Dismiss the current alert
    pub fn acknowledge_alert(&mut self) -> Option<ViolationRecord> {
        self.alerts.pop_front()
    }

    /// Clear session state (violations, alerts, debounce counters).
    ///
    /// Only an explicit session reset shrinks the violation list.
    pub fn reset(&mut self) {
        self.violations.clear();
        self.alerts.clear();
        self.no_face_frames = 0;
        self.multi_face_frames = 0;
        self.last_detection_emit.clear();
    }

    fn emit(
        &mut self,
        kind: ViolationKind,
        severity: Severity,
        description: String,
    ) -> ViolationRecord {
        let record = ViolationRecord::new(self.attempt_id.clone(), kind, severity, description);
        info!(
            "violation {} ({:?}/{:?}): {}",
            record.id, record.kind, record.severity, record.description
        );

        self.violations.push(record.clone());
        if let Some(sink) = self.sink.as_mut() {
            sink(&record);
        }
        self.alerts.push_back(record.clone());
        debug!("{} violations this session", self.violations.len());
        record
    }
}

impl Drop for ProctorMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
