use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// Device/permission/stream acquisition failed. Terminal for the
    /// current capture mode; the session surfaces it and does not retry.
    #[error("capture unavailable: {0}")]
    Unavailable(String),
    /// The source was acquired but a frame could not be produced.
    #[error("frame read failed: {0}")]
    Frame(String),
}

/// Domain interface for live capture devices.
///
/// The session owns at most one acquired source at a time; the polling
/// worker drives it from a single thread.
pub trait CaptureSource: Send {
    /// Acquire the underlying device or stream. May block for as long as
    /// the device takes to answer. Failure is terminal for the mode.
    fn acquire(&mut self) -> Result<(), CaptureError>;

    /// Produce the current frame. Only valid after a successful `acquire`.
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Stop streaming and detach from the device. Idempotent; safe to call
    /// when nothing is acquired.
    fn release(&mut self);
}
