/// Which capture surface feeds detection. Exactly one is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureMode {
    /// Continuously streaming camera feed, polled by the detection loop.
    Live,
    /// A single decoded uploaded image.
    Still,
}

/// State of one independent request flow (check-in, registration).
///
/// At most one request per flow is in flight at a time; `Succeeded` and
/// `Failed` both permit a new submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestLifecycle {
    Idle,
    InFlight,
    Succeeded { message: String },
    Failed { message: String },
}

impl RequestLifecycle {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestLifecycle::InFlight)
    }

    /// User-visible outcome message, if the flow has settled.
    pub fn message(&self) -> Option<&str> {
        match self {
            RequestLifecycle::Succeeded { message } | RequestLifecycle::Failed { message } => {
                Some(message)
            }
            _ => None,
        }
    }
}
