use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
#[error("could not decode image: {0}")]
pub struct DecodeError(#[from] image::ImageError);

/// Decode an uploaded image (any format the `image` crate recognizes) into
/// an RGB [`Frame`].
pub fn decode(bytes: &[u8]) -> Result<Frame, DecodeError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = decoded.into_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height))
}
