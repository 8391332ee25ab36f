//! Raw sensor frame decoding and the frame source abstraction.

use alloc::vec::Vec;

use crate::image::{GrayImage, ImageError, Size};

/// Sensor resolution of the reference thermal core.
pub const SENSOR_SIZE: Size = Size::new(256, 192);

/// Bytes per pixel of a packed YUYV frame.
pub const YUYV_BYTES_PER_PIXEL: usize = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameError {
    /// Fewer bytes than one full frame.
    Truncated { expected: usize, actual: usize },
    /// Frame dimensions are unusable.
    Image(ImageError),
}

impl From<ImageError> for FrameError {
    fn from(value: ImageError) -> Self {
        Self::Image(value)
    }
}

/// Number of raw bytes in one YUYV frame of `size`.
pub const fn yuyv_frame_len(size: Size) -> usize {
    size.area() * YUYV_BYTES_PER_PIXEL
}

/// Extracts the luma plane of a packed YUYV frame.
///
/// The thermal core streams its 8-bit intensity in the Y samples; chroma
/// bytes carry nothing useful and are dropped. Trailing bytes beyond one
/// frame are ignored.
pub fn decode_yuyv_luma(raw: &[u8], size: Size) -> Result<GrayImage, FrameError> {
    let expected = yuyv_frame_len(size);
    if raw.len() < expected {
        return Err(FrameError::Truncated {
            expected,
            actual: raw.len(),
        });
    }

    let luma: Vec<u8> = raw[..expected]
        .chunks_exact(YUYV_BYTES_PER_PIXEL)
        .map(|pair| pair[0])
        .collect();

    Ok(GrayImage::from_raw(size, luma)?)
}

/// Blocking producer of sensor frames.
pub trait FrameSource {
    type Error;

    /// Dimensions of every frame this source yields.
    fn frame_size(&self) -> Size;

    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<GrayImage, Self::Error>;
}
