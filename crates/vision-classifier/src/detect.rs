//! Detection types and the detector trait

use media_session::CapturedFrame;
use serde::{Deserialize, Serialize};

use crate::ClassifierError;

/// Axis-aligned bounding box in frame pixels
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One detected object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Category label (e.g. "face", "cell phone")
    pub category: String,
    /// Detection confidence (0-1)
    pub score: f32,
    /// Location in the frame
    pub bbox: BoundingBox,
}

/// Result of one detection cycle over a video frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Detected objects, highest score first
    pub objects: Vec<DetectedObject>,
    /// Monotonic timestamp of the analyzed frame (milliseconds)
    pub timestamp_ms: u64,
}

impl DetectionResult {
    /// Number of detected faces
    pub fn face_count(&self) -> usize {
        self.objects.iter().filter(|o| o.category == "face").count()
    }

    /// Highest-scoring object, if any
    pub fn top(&self) -> Option<&DetectedObject> {
        self.objects
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// A loaded detection model.
///
/// Implementations own the underlying model resource; [`close`](Self::close)
/// releases it and must be idempotent.
pub trait Detector: Send {
    /// Run detection against one video frame
    fn detect(
        &mut self,
        frame: &CapturedFrame,
        timestamp_ms: u64,
    ) -> Result<DetectionResult, ClassifierError>;

    /// Release the underlying model resource
    fn close(&mut self) {}
}

/// Deterministic luminance-based detector.
///
/// Stands in for a real face model: a frame too dark to show a face yields
/// zero detections, anything else yields one full-frame face whose score
/// scales with brightness. Used as the default backend and in tests.
#[derive(Debug, Clone)]
pub struct HeuristicDetector {
    /// Mean luma below which the frame counts as showing no face
    pub min_face_luma: f32,
}

impl Default for HeuristicDetector {
    fn default() -> Self {
        Self { min_face_luma: 20.0 }
    }
}

impl Detector for HeuristicDetector {
    fn detect(
        &mut self,
        frame: &CapturedFrame,
        timestamp_ms: u64,
    ) -> Result<DetectionResult, ClassifierError> {
        if !frame.has_usable_dimensions() {
            return Err(ClassifierError::UnusableFrame);
        }

        let luma = frame.mean_luma();
        let objects = if luma < self.min_face_luma {
            Vec::new()
        } else {
            vec![DetectedObject {
                category: "face".to_string(),
                score: (luma / 255.0).clamp(0.5, 0.99),
                bbox: BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: frame.width as f32,
                    height: frame.height as f32,
                },
            }]
        };

        Ok(DetectionResult {
            objects,
            timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(level: u8) -> CapturedFrame {
        CapturedFrame::new(vec![level; 4 * 4 * 3], 4, 4, 0, 0)
    }

    #[test]
    fn test_heuristic_detects_face_in_bright_frame() {
        let mut detector = HeuristicDetector::default();
        let result = detector.detect(&solid_frame(128), 7).unwrap();
        assert_eq!(result.face_count(), 1);
        assert_eq!(result.timestamp_ms, 7);
        assert!(result.top().unwrap().score >= 0.5);
    }

    #[test]
    fn test_heuristic_sees_no_face_in_dark_frame() {
        let mut detector = HeuristicDetector::default();
        let result = detector.detect(&solid_frame(5), 0).unwrap();
        assert_eq!(result.face_count(), 0);
    }

    #[test]
    fn test_heuristic_rejects_unusable_frame() {
        let mut detector = HeuristicDetector::default();
        let err = detector.detect(&CapturedFrame::default(), 0).unwrap_err();
        assert!(matches!(err, ClassifierError::UnusableFrame));
    }

    #[test]
    fn test_face_count_ignores_other_categories() {
        let result = DetectionResult {
            objects: vec![
                DetectedObject {
                    category: "face".into(),
                    score: 0.9,
                    bbox: BoundingBox::default(),
                },
                DetectedObject {
                    category: "cell phone".into(),
                    score: 0.8,
                    bbox: BoundingBox::default(),
                },
            ],
            timestamp_ms: 0,
        };
        assert_eq!(result.face_count(), 1);
        assert_eq!(result.top().unwrap().category, "face");
    }
}
