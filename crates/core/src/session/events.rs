use crate::detection::domain::face_engine::{FaceBox, FaceDetection};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::session::lifecycle::{CaptureMode, RequestLifecycle};

/// Rendering-facing slice of a detection: geometry only, no descriptor.
#[derive(Clone, Debug)]
pub struct DetectionView {
    pub region: FaceBox,
    pub landmarks: FaceLandmarks,
}

impl From<&FaceDetection> for DetectionView {
    fn from(detection: &FaceDetection) -> Self {
        Self {
            region: detection.region.clone(),
            landmarks: detection.landmarks.clone(),
        }
    }
}

/// Everything a subscriber needs to render the session.
///
/// The session emits these on a single channel; subscribers hold no other
/// handle into session state.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    ModeChanged(CaptureMode),
    /// Camera or engine could not be brought up. Terminal for the current
    /// mode; the session will not retry on its own.
    CaptureUnavailable(String),
    /// The latest detection, or `None` when the face left the frame.
    /// Emitted on transitions, not on every poll.
    DetectionChanged(Option<DetectionView>),
    /// An uploaded image was decoded and scanned.
    StillLoaded { width: u32, height: u32 },
    AutoSubmitArmed,
    AutoSubmitCancelled,
    CheckIn(RequestLifecycle),
    Registration(RequestLifecycle),
    RegistrationFormCleared,
}
