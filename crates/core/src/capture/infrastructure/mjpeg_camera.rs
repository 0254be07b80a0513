//! HTTP camera source.
//!
//! Speaks the two streaming conventions common on network cameras: a
//! `multipart/x-mixed-replace` MJPEG stream read incrementally, or a plain
//! JPEG snapshot endpoint fetched once per frame.

use std::io::Read;

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::shared::constants::MAX_JPEG_BYTES;
use crate::shared::frame::Frame;

pub struct MjpegCamera {
    url: String,
    stream: Option<Stream>,
}

enum Stream {
    Mjpeg(MjpegStream),
    Snapshot(reqwest::blocking::Client),
}

impl MjpegCamera {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream: None,
        }
    }
}

impl CaptureSource for MjpegCamera {
    fn acquire(&mut self) -> Result<(), CaptureError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;
        let response = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;

        let multipart = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("multipart"))
            .unwrap_or(false);

        self.stream = Some(if multipart {
            log::info!("camera {}: mjpeg stream", self.url);
            Stream::Mjpeg(MjpegStream::new(Box::new(response)))
        } else {
            log::info!("camera {}: snapshot endpoint", self.url);
            Stream::Snapshot(client)
        });
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CaptureError::Frame("camera not acquired".to_string()))?;

        let jpeg = match stream {
            Stream::Mjpeg(stream) => stream.read_next_jpeg()?,
            Stream::Snapshot(client) => fetch_snapshot(client, &self.url)?,
        };
        decode_jpeg(&jpeg)
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("camera {} released", self.url);
        }
    }
}

struct MjpegStream {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
}

impl MjpegStream {
    fn new(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64 * 1024),
        }
    }

    fn read_next_jpeg(&mut self) -> Result<Vec<u8>, CaptureError> {
        let mut chunk = vec![0u8; 8192];
        loop {
            if let Some((start, end)) = find_jpeg_bounds(&self.buffer) {
                let jpeg = self.buffer[start..end].to_vec();
                self.buffer.drain(..end);
                return Ok(jpeg);
            }

            let read = self
                .reader
                .read(&mut chunk)
                .map_err(|e| CaptureError::Frame(e.to_string()))?;
            if read == 0 {
                return Err(CaptureError::Frame("mjpeg stream ended".to_string()));
            }
            self.buffer.extend_from_slice(&chunk[..read]);

            // Without a complete frame in sight, cap the buffer so a
            // marker-free stream cannot grow it unboundedly.
            if self.buffer.len() > MAX_JPEG_BYTES {
                self.buffer.clear();
                return Err(CaptureError::Frame(
                    "no jpeg frame within size limit".to_string(),
                ));
            }
        }
    }
}

fn fetch_snapshot(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<Vec<u8>, CaptureError> {
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| CaptureError::Frame(e.to_string()))?;
    let mut bytes = Vec::new();
    response
        .take(MAX_JPEG_BYTES as u64)
        .read_to_end(&mut bytes)
        .map_err(|e| CaptureError::Frame(e.to_string()))?;
    if bytes.is_empty() {
        return Err(CaptureError::Frame("empty jpeg snapshot".to_string()));
    }
    Ok(bytes)
}

fn decode_jpeg(bytes: &[u8]) -> Result<Frame, CaptureError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| CaptureError::Frame(e.to_string()))?;
    let rgb = decoded.into_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height))
}

/// Locate one complete JPEG (SOI `FFD8` .. EOI `FFD9`) in `buffer`,
/// returning byte offsets `[start, end)`.
fn find_jpeg_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let start = buffer.windows(2).position(|w| w == [0xFF, 0xD8])?;
    let end = buffer[start + 2..]
        .windows(2)
        .position(|w| w == [0xFF, 0xD9])
        .map(|i| start + 2 + i + 2)?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn jpeg_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([120, 60, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    /// Marker-delimited stand-in; scanner behavior does not depend on the
    /// payload being decodable.
    fn fake_jpeg(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        bytes
    }

    #[test]
    fn test_find_jpeg_bounds_with_multipart_noise() {
        let mut stream = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        let jpeg = fake_jpeg(&[0x11, 0x22, 0x33]);
        stream.extend_from_slice(&jpeg);
        stream.extend_from_slice(b"\r\n--frame");

        let (start, end) = find_jpeg_bounds(&stream).unwrap();
        assert_eq!(&stream[start..end], &jpeg[..]);
    }

    #[test]
    fn test_find_jpeg_bounds_incomplete_frame() {
        let jpeg = fake_jpeg(&[0x11, 0x22]);
        assert!(find_jpeg_bounds(&jpeg[..jpeg.len() - 2]).is_none());
        assert!(find_jpeg_bounds(b"no markers here").is_none());
    }

    #[test]
    fn test_mjpeg_stream_extracts_consecutive_frames() {
        let first = fake_jpeg(&[0x01; 16]);
        let second = fake_jpeg(&[0x02; 16]);
        let mut wire = Vec::new();
        for jpeg in [&first, &second] {
            wire.extend_from_slice(b"--frame\r\n\r\n");
            wire.extend_from_slice(jpeg);
            wire.extend_from_slice(b"\r\n");
        }

        let mut stream = MjpegStream::new(Box::new(Cursor::new(wire)));
        assert_eq!(stream.read_next_jpeg().unwrap(), first);
        assert_eq!(stream.read_next_jpeg().unwrap(), second);
    }

    #[test]
    fn test_mjpeg_stream_ends_cleanly() {
        let mut stream = MjpegStream::new(Box::new(Cursor::new(b"--frame\r\n".to_vec())));
        assert!(stream.read_next_jpeg().is_err());
    }

    #[test]
    fn test_decode_jpeg_to_frame() {
        let frame = decode_jpeg(&jpeg_bytes()).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 4);
    }

    #[test]
    fn test_next_frame_before_acquire_fails() {
        let mut camera = MjpegCamera::new("http://127.0.0.1:1/stream");
        assert!(matches!(
            camera.next_frame(),
            Err(CaptureError::Frame(_))
        ));
    }

    #[test]
    fn test_release_idempotent() {
        let mut camera = MjpegCamera::new("http://127.0.0.1:1/stream");
        camera.release();
        camera.release();
    }
}
