use crate::backend::domain::check_in_client::{BackendError, BackendVerdict};
use crate::detection::domain::face_engine::FaceDetection;

/// Result of decoding and scanning an uploaded image.
#[derive(Debug)]
pub(crate) struct StillScan {
    pub width: u32,
    pub height: u32,
    pub outcome: Option<FaceDetection>,
}

/// Completions flowing from worker threads back to the session control
/// loop. Capture-scoped variants carry the generation they were started
/// under; the control loop discards stale ones.
#[derive(Debug)]
pub(crate) enum Update {
    /// One finished detection attempt from the polling worker.
    Detection {
        generation: u64,
        outcome: Option<FaceDetection>,
    },
    /// The polling worker died: camera acquisition, engine readiness or
    /// frame production failed. Terminal for the live session.
    PollFailed { generation: u64, message: String },
    /// An uploaded image finished decoding + scanning, or failed with a
    /// user-facing message.
    StillReady {
        generation: u64,
        result: Result<StillScan, String>,
    },
    /// A check-in submission settled.
    CheckInSettled {
        generation: u64,
        result: Result<BackendVerdict, BackendError>,
    },
    /// A registration submission settled. Registration is independent of
    /// capture mode, so no generation is attached.
    RegistrationSettled {
        result: Result<BackendVerdict, BackendError>,
    },
}
