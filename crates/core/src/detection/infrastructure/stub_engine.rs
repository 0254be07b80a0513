use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::detection::domain::face_engine::{EngineError, FaceBox, FaceDetection, FaceEngine};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::constants::DESCRIPTOR_LEN;
use crate::shared::descriptor::Descriptor;
use crate::shared::frame::Frame;

/// Mean luminance below which a frame is treated as empty.
const DEFAULT_PRESENCE_THRESHOLD: f32 = 16.0;

/// Deterministic engine for harnesses and tests.
///
/// Reports a face whenever the frame is bright enough, with a descriptor
/// derived from a hash of the pixel data, so identical frames always map to
/// identical descriptors and distinct frames almost never collide.
pub struct StubEngine {
    ready: bool,
    presence_threshold: f32,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            ready: false,
            presence_threshold: DEFAULT_PRESENCE_THRESHOLD,
        }
    }

    pub fn with_presence_threshold(mut self, threshold: f32) -> Self {
        self.presence_threshold = threshold;
        self
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceEngine for StubEngine {
    fn ensure_ready(&mut self) -> Result<(), EngineError> {
        if !self.ready {
            log::debug!("stub engine ready, threshold {}", self.presence_threshold);
            self.ready = true;
        }
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<FaceDetection>, EngineError> {
        if !self.ready {
            return Err(EngineError::Detection(
                "detect called before ensure_ready".to_string(),
            ));
        }

        let pixels = frame.data();
        if pixels.is_empty() {
            return Ok(None);
        }
        let mean = pixels.iter().map(|&b| b as u64).sum::<u64>() as f32 / pixels.len() as f32;
        if mean < self.presence_threshold {
            return Ok(None);
        }

        let mut hasher = DefaultHasher::new();
        pixels.hash(&mut hasher);
        let descriptor = descriptor_from_seed(hasher.finish());

        let w = frame.width() as f32;
        let h = frame.height() as f32;
        let region = FaceBox {
            x: w * 0.25,
            y: h * 0.25,
            width: w * 0.5,
            height: h * 0.5,
        };
        let landmarks = FaceLandmarks::new([
            (w * 0.375, h * 0.4),
            (w * 0.625, h * 0.4),
            (w * 0.5, h * 0.5),
            (w * 0.42, h * 0.62),
            (w * 0.58, h * 0.62),
        ]);

        Ok(Some(FaceDetection {
            region,
            landmarks,
            descriptor,
        }))
    }
}

/// Expands a 64-bit seed into a full-length descriptor in [-1, 1] using a
/// splitmix64 stream.
fn descriptor_from_seed(seed: u64) -> Descriptor {
    let mut state = seed;
    let components = (0..DESCRIPTOR_LEN)
        .map(|_| {
            state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^= z >> 31;
            (z as f64 / u64::MAX as f64 * 2.0 - 1.0) as f32
        })
        .collect();
    Descriptor::new(components)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bright_frame() -> Frame {
        Frame::new(vec![200u8; 4 * 4 * 3], 4, 4)
    }

    fn dark_frame() -> Frame {
        Frame::new(vec![2u8; 4 * 4 * 3], 4, 4)
    }

    #[test]
    fn test_detect_before_ready_errors() {
        let mut engine = StubEngine::new();
        assert!(engine.detect(&bright_frame()).is_err());
    }

    #[test]
    fn test_bright_frame_detected_with_full_descriptor() {
        let mut engine = StubEngine::new();
        engine.ensure_ready().unwrap();
        let detection = engine.detect(&bright_frame()).unwrap().unwrap();
        assert_eq!(detection.descriptor.len(), DESCRIPTOR_LEN);
        assert!(detection.region.width > 0.0);
    }

    #[test]
    fn test_dark_frame_is_negative() {
        let mut engine = StubEngine::new();
        engine.ensure_ready().unwrap();
        assert!(engine.detect(&dark_frame()).unwrap().is_none());
    }

    #[test]
    fn test_identical_frames_give_identical_descriptors() {
        let mut engine = StubEngine::new();
        engine.ensure_ready().unwrap();
        let a = engine.detect(&bright_frame()).unwrap().unwrap();
        let b = engine.detect(&bright_frame()).unwrap().unwrap();
        assert_eq!(a.descriptor, b.descriptor);
    }

    #[test]
    fn test_distinct_frames_give_distinct_descriptors() {
        let mut engine = StubEngine::new();
        engine.ensure_ready().unwrap();
        let a = engine.detect(&bright_frame()).unwrap().unwrap();
        let other = Frame::new(vec![180u8; 4 * 4 * 3], 4, 4);
        let b = engine.detect(&other).unwrap().unwrap();
        assert_ne!(a.descriptor, b.descriptor);
    }

    #[test]
    fn test_ensure_ready_idempotent() {
        let mut engine = StubEngine::new();
        engine.ensure_ready().unwrap();
        engine.ensure_ready().unwrap();
        assert!(engine.detect(&bright_frame()).unwrap().is_some());
    }
}
