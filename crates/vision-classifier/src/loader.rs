//! Cancellation-safe classifier loading

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use media_session::CapturedFrame;

use crate::detect::{DetectionResult, Detector};
use crate::ClassifierError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadPhase {
    Loading,
    Ready,
    Failed(String),
}

struct Slot {
    phase: LoadPhase,
    detector: Option<Box<dyn Detector>>,
}

struct Shared {
    alive: AtomicBool,
    slot: Mutex<Slot>,
}

/// Owns one detection model's load-use-release lifecycle.
///
/// The model loads at most once per loader. `ready()` flips true only after
/// a successful [`commit`](Self::commit); a load failure is terminal and
/// lands in [`error`](Self::error). A commit arriving after
/// [`shutdown`](Self::shutdown) closes the late handle immediately and
/// writes nothing.
#[derive(Clone)]
pub struct ClassifierLoader {
    shared: Arc<Shared>,
}

impl ClassifierLoader {
    /// Create a loader in the loading phase
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                alive: AtomicBool::new(true),
                slot: Mutex::new(Slot {
                    phase: LoadPhase::Loading,
                    detector: None,
                }),
            }),
        }
    }

    /// Whether a model is loaded and the loader is still alive
    pub fn ready(&self) -> bool {
        if !self.shared.alive.load(Ordering::SeqCst) {
            return false;
        }
        let slot = self.lock_slot();
        slot.phase == LoadPhase::Ready && slot.detector.is_some()
    }

    /// Terminal load failure, if one occurred
    pub fn error(&self) -> Option<String> {
        match &self.lock_slot().phase {
            LoadPhase::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Deliver the result of the asynchronous model load.
    ///
    /// Discarded silently when the loader was shut down first (expected
    /// race) or when a model was already committed; a discarded handle is
    /// closed before being dropped.
    pub fn commit(&self, result: Result<Box<dyn Detector>, ClassifierError>) {
        if !self.shared.alive.load(Ordering::SeqCst) {
            debug!("discarding classifier load that resolved after shutdown");
            if let Ok(mut detector) = result {
                detector.close();
            }
            return;
        }

        let mut slot = self.lock_slot();
        if slot.phase != LoadPhase::Loading {
            debug!("discarding duplicate classifier load result");
            if let Ok(mut detector) = result {
                detector.close();
            }
            return;
        }

        match result {
            Ok(detector) => {
                info!("classifier model loaded");
                slot.detector = Some(detector);
                slot.phase = LoadPhase::Ready;
            }
            Err(e) => {
                warn!("classifier model load failed: {}", e);
                slot.phase = LoadPhase::Failed(e.to_string());
            }
        }
    }

    /// Run the load future on the tokio runtime and commit its result
    pub fn load_in_background<F>(&self, load: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<Box<dyn Detector>, ClassifierError>> + Send + 'static,
    {
        let loader = self.clone();
        tokio::spawn(async move {
            let result = load.await;
            loader.commit(result);
        })
    }

    /// Run detection with the loaded model.
    ///
    /// Returns `None` when no model is ready (load pending, failed, or the
    /// loader was shut down).
    pub fn detect(
        &self,
        frame: &CapturedFrame,
        timestamp_ms: u64,
    ) -> Option<Result<DetectionResult, ClassifierError>> {
        if !self.shared.alive.load(Ordering::SeqCst) {
            return None;
        }
        let mut slot = self.lock_slot();
        let detector = slot.detector.as_mut()?;
        Some(detector.detect(frame, timestamp_ms))
    }

    /// Release the model and refuse any still-in-flight load.
    ///
    /// Idempotent; the loader is unusable afterwards.
    pub fn shutdown(&self) {
        let was_alive = self.shared.alive.swap(false, Ordering::SeqCst);
        let mut slot = self.lock_slot();
        if let Some(mut detector) = slot.detector.take() {
            detector.close();
            info!("classifier model released");
        } else if was_alive {
            debug!("classifier shut down before any model was committed");
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.shared
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ClassifierLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::HeuristicDetector;
    use std::sync::atomic::AtomicUsize;

    /// Detector counting close() calls through a shared counter
    struct TrackedDetector {
        inner: HeuristicDetector,
        closes: Arc<AtomicUsize>,
    }

    impl Detector for TrackedDetector {
        fn detect(
            &mut self,
            frame: &CapturedFrame,
            timestamp_ms: u64,
        ) -> Result<DetectionResult, ClassifierError> {
            self.inner.detect(frame, timestamp_ms)
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tracked(closes: &Arc<AtomicUsize>) -> Box<dyn Detector> {
        Box::new(TrackedDetector {
            inner: HeuristicDetector::default(),
            closes: closes.clone(),
        })
    }

    fn bright_frame() -> CapturedFrame {
        CapturedFrame::new(vec![200; 4 * 4 * 3], 4, 4, 0, 0)
    }

    #[test]
    fn test_ready_only_after_successful_commit() {
        let loader = ClassifierLoader::new();
        assert!(!loader.ready());
        assert!(loader.error().is_none());
        assert!(loader.detect(&bright_frame(), 0).is_none());

        loader.commit(Ok(Box::new(HeuristicDetector::default())));
        assert!(loader.ready());

        let result = loader.detect(&bright_frame(), 3).unwrap().unwrap();
        assert_eq!(result.face_count(), 1);
    }

    #[test]
    fn test_load_failure_is_terminal() {
        let loader = ClassifierLoader::new();
        loader.commit(Err(ClassifierError::ModelLoad("404".into())));

        assert!(!loader.ready());
        assert_eq!(loader.error().unwrap(), "Model loading failed: 404");

        // A later success no longer counts
        loader.commit(Ok(Box::new(HeuristicDetector::default())));
        assert!(!loader.ready());
    }

    #[test]
    fn test_commit_after_shutdown_closes_handle() {
        let closes = Arc::new(AtomicUsize::new(0));
        let loader = ClassifierLoader::new();

        // Unmount before the simulated load resolves
        loader.shutdown();
        loader.commit(Ok(tracked(&closes)));

        assert!(!loader.ready());
        assert!(loader.error().is_none());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_releases_model_and_is_idempotent() {
        let closes = Arc::new(AtomicUsize::new(0));
        let loader = ClassifierLoader::new();
        loader.commit(Ok(tracked(&closes)));
        assert!(loader.ready());

        loader.shutdown();
        loader.shutdown();
        assert!(!loader.ready());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(loader.detect(&bright_frame(), 0).is_none());
    }

    #[tokio::test]
    async fn test_background_load_commits() {
        let loader = ClassifierLoader::new();
        let handle = loader.load_in_background(async {
            Ok(Box::new(HeuristicDetector::default()) as Box<dyn Detector>)
        });
        handle.await.unwrap();
        assert!(loader.ready());
    }

    #[tokio::test]
    async fn test_background_load_after_shutdown_is_discarded() {
        let closes = Arc::new(AtomicUsize::new(0));
        let loader = ClassifierLoader::new();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let pending = tracked(&closes);
        let handle = loader.load_in_background(async move {
            // Hold the load until the test releases it
            let _ = rx.await;
            Ok(pending)
        });

        loader.shutdown();
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(!loader.ready());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
