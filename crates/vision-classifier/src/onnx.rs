//! ONNX detection backend (feature `onnx`)
//!
//! Expects a detection model taking a normalized NCHW float input and
//! producing rows of `[x, y, w, h, score, class]` in input-relative
//! coordinates. Class 0 maps to "face"; other classes keep a numeric label.

use tract_onnx::prelude::*;

use media_session::CapturedFrame;

use crate::detect::{BoundingBox, DetectedObject, DetectionResult, Detector};
use crate::ClassifierError;

type RunnableOnnx = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Detector backed by a tract-onnx model
pub struct OnnxDetector {
    plan: Option<RunnableOnnx>,
    input_width: u32,
    input_height: u32,
    score_threshold: f32,
}

impl OnnxDetector {
    /// Load and optimize a model from disk
    pub fn load(path: &str, input_width: u32, input_height: u32) -> Result<Self, ClassifierError> {
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?
            .into_optimized()
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?
            .into_runnable()
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;

        Ok(Self {
            plan: Some(plan),
            input_width,
            input_height,
            score_threshold: 0.5,
        })
    }

    /// Nearest-neighbor resample of the frame into a normalized NCHW tensor
    fn frame_to_tensor(&self, frame: &CapturedFrame) -> Result<Tensor, ClassifierError> {
        let (w, h) = (self.input_width as usize, self.input_height as usize);
        let mut input = vec![0f32; 3 * w * h];

        for y in 0..h {
            for x in 0..w {
                let src_x = (x as u32 * frame.width / self.input_width).min(frame.width - 1);
                let src_y = (y as u32 * frame.height / self.input_height).min(frame.height - 1);
                let src = ((src_y * frame.width + src_x) * 3) as usize;
                for c in 0..3 {
                    input[c * w * h + y * w + x] = frame.data[src + c] as f32 / 255.0;
                }
            }
        }

        Tensor::from_shape(&[1, 3, h, w], &input)
            .map_err(|e| ClassifierError::Detection(e.to_string()))
    }
}

impl Detector for OnnxDetector {
    fn detect(
        &mut self,
        frame: &CapturedFrame,
        timestamp_ms: u64,
    ) -> Result<DetectionResult, ClassifierError> {
        if !frame.has_usable_dimensions() {
            return Err(ClassifierError::UnusableFrame);
        }
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| ClassifierError::Detection("model released".into()))?;

        let input = self.frame_to_tensor(frame)?;
        let outputs = plan
            .run(tvec!(input.into()))
            .map_err(|e| ClassifierError::Detection(e.to_string()))?;
        let rows = outputs[0]
            .as_slice::<f32>()
            .map_err(|e| ClassifierError::Detection(e.to_string()))?;

        let scale_x = frame.width as f32 / self.input_width as f32;
        let scale_y = frame.height as f32 / self.input_height as f32;
        let mut objects: Vec<DetectedObject> = rows
            .chunks_exact(6)
            .filter(|row| row[4] >= self.score_threshold)
            .map(|row| DetectedObject {
                category: if row[5] as u32 == 0 {
                    "face".to_string()
                } else {
                    format!("class-{}", row[5] as u32)
                },
                score: row[4],
                bbox: BoundingBox {
                    x: row[0] * scale_x,
                    y: row[1] * scale_y,
                    width: row[2] * scale_x,
                    height: row[3] * scale_y,
                },
            })
            .collect();
        objects.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(DetectionResult {
            objects,
            timestamp_ms,
        })
    }

    fn close(&mut self) {
        self.plan = None;
    }
}
