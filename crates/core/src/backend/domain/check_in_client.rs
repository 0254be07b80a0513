use thiserror::Error;

use crate::shared::descriptor::Descriptor;

/// Outcome of a check-in or registration request the server answered.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendVerdict {
    /// Confident match with identity metadata.
    Matched { name: String, distance: f64 },
    /// Success without identity metadata (registration acks).
    Accepted { message: Option<String> },
    /// The server processed the request and rejected it; `message` is the
    /// server's explanation when it sent one.
    Rejected { message: Option<String> },
}

#[derive(Error, Debug)]
pub enum BackendError {
    /// The request never produced a usable response (connection refused,
    /// timeout, mid-body failure).
    #[error("request could not be completed: {0}")]
    Transport(String),
    /// The server answered, but not with the JSON contract (5xx, HTML
    /// error page, truncated body).
    #[error("server returned an unusable response: {0}")]
    Protocol(String),
}

/// Domain interface for the remote verification service.
///
/// Implementations are shared across worker threads, hence `&self` and
/// `Send + Sync`.
pub trait CheckInClient: Send + Sync {
    /// Descriptor-based check-in (`descriptor` as packed LE floats).
    fn check_in_descriptor(&self, descriptor: &Descriptor)
        -> Result<BackendVerdict, BackendError>;

    /// Whole-image check-in (`imageFile` as encoded image bytes).
    fn check_in_image(&self, image: &[u8]) -> Result<BackendVerdict, BackendError>;

    /// Enrol a new identity from an encoded image.
    fn register_image(
        &self,
        name: &str,
        code: &str,
        image: &[u8],
    ) -> Result<BackendVerdict, BackendError>;

    /// Enrol a new identity from a descriptor.
    fn register_descriptor(
        &self,
        name: &str,
        code: &str,
        descriptor: &Descriptor,
    ) -> Result<BackendVerdict, BackendError>;
}
