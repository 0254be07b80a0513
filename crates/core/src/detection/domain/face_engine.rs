use thiserror::Error;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::descriptor::Descriptor;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model load failed: {0}")]
    ModelLoad(String),
    #[error("detection failed: {0}")]
    Detection(String),
}

/// Face bounding box in pixel coordinates of the source frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One positive detection: where the face is, its landmark geometry
/// (pass-through for rendering) and the embedding used for matching.
#[derive(Clone, Debug)]
pub struct FaceDetection {
    pub region: FaceBox,
    pub landmarks: FaceLandmarks,
    pub descriptor: Descriptor,
}

/// Domain interface for face detection engines.
///
/// An engine serves live camera frames and decoded still uploads alike.
/// Implementations may need a one-time model load; callers must run
/// `ensure_ready` to completion before the first `detect`. Implementations
/// may be stateful, hence `&mut self`.
pub trait FaceEngine: Send {
    /// Load models or other heavyweight state. Idempotent; may block for
    /// as long as a download/initialization takes.
    fn ensure_ready(&mut self) -> Result<(), EngineError>;

    /// Run one detection attempt. At most one face is reported; `None`
    /// means no face was found in the frame.
    fn detect(&mut self, frame: &Frame) -> Result<Option<FaceDetection>, EngineError>;
}
