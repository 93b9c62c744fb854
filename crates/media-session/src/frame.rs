//! Captured frame types and JPEG encoding

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};

use crate::MediaError;

/// Decoded RGB frame pulled from the live video feed
#[derive(Debug, Clone, Default)]
pub struct CapturedFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (milliseconds, monotonic)
    pub timestamp_ms: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl CapturedFrame {
    /// Create a frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ms: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ms,
            sequence,
        }
    }

    /// Whether the frame has usable dimensions and a matching pixel buffer.
    ///
    /// A video element that has not finished negotiating reports zero
    /// dimensions; such frames must not be encoded or run through detection.
    pub fn has_usable_dimensions(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width * self.height * 3) as usize
    }

    /// Mean luminance over the whole frame (0-255)
    pub fn mean_luma(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .data
            .chunks_exact(3)
            .map(|px| {
                px[0] as f64 * 0.299 + px[1] as f64 * 0.587 + px[2] as f64 * 0.114
            })
            .sum();
        (sum / (self.data.len() / 3) as f64) as f32
    }

    /// Encode as JPEG at the given quality (1-100)
    pub fn encode_jpeg(&self, quality: u8) -> Result<EncodedFrame, MediaError> {
        if !self.has_usable_dimensions() {
            return Err(MediaError::Encode("frame has no usable dimensions".into()));
        }

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality)
            .write_image(&self.data, self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|e| MediaError::Encode(e.to_string()))?;

        Ok(EncodedFrame {
            bytes,
            width: self.width,
            height: self.height,
            timestamp_ms: self.timestamp_ms,
        })
    }
}

/// JPEG-encoded snapshot ready for upstream transmission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedFrame {
    /// JPEG bytes
    pub bytes: Vec<u8>,
    /// Source frame width
    pub width: u32,
    /// Source frame height
    pub height: u32,
    /// Source frame capture timestamp (milliseconds)
    pub timestamp_ms: u64,
}
