use std::time::Duration;

/// Length of the face descriptor produced by the bundled engines.
///
/// The wire format (`descriptor` multipart field) is this many 4-byte
/// IEEE-754 little-endian floats.
pub const DESCRIPTOR_LEN: usize = 128;

/// Period of the live detection loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sustained-detection delay before an automatic check-in fires.
pub const AUTO_SUBMIT_DELAY: Duration = Duration::from_millis(3000);

/// Upper bound for a single JPEG pulled off a camera stream.
pub const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;
