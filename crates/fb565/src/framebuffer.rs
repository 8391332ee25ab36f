//! In-memory 16-bit framebuffer.

use alloc::{vec, vec::Vec};

use crate::pixel::PixelOrder;

/// Row-major 5-6-5 framebuffer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    order: PixelOrder,
    words: Vec<u16>,
}

impl FrameBuffer {
    /// Creates a black framebuffer.
    pub fn new(width: usize, height: usize, order: PixelOrder) -> Self {
        Self {
            width,
            height,
            order,
            words: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn order(&self) -> PixelOrder {
        self.order
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn clear(&mut self, word: u16) {
        self.words.fill(word);
    }

    /// Sets a pixel word.
    ///
    /// Returns `true` when pixel is in bounds, `false` otherwise.
    pub fn set_pixel(&mut self, x: usize, y: usize, word: u16) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.words[y * self.width + x] = word;
        true
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.words[y * self.width + x])
    }

    /// Packs a tightly packed RGB888 image into the buffer at the origin.
    ///
    /// The copy is clipped to the overlap of both sizes. Returns `false`
    /// when `rgb` is shorter than `src_width * src_height * 3`.
    pub fn blit_rgb888(&mut self, rgb: &[u8], src_width: usize, src_height: usize) -> bool {
        let src_stride = src_width * 3;
        if rgb.len() < src_stride * src_height {
            return false;
        }

        let cols = src_width.min(self.width);
        let rows = src_height.min(self.height);
        for y in 0..rows {
            let src = &rgb[y * src_stride..y * src_stride + cols * 3];
            let dst = &mut self.words[y * self.width..y * self.width + cols];
            for (word, px) in dst.iter_mut().zip(src.chunks_exact(3)) {
                *word = self.order.pack(px[0], px[1], px[2]);
            }
        }
        true
    }

    /// Words of row `y`.
    pub fn line(&self, y: usize) -> Option<&[u16]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&self.words[start..start + self.width])
    }

    /// Encodes row `y` as little-endian bytes into `out`.
    ///
    /// Returns the number of bytes written, or `None` when `y` is out of
    /// bounds or `out` is shorter than `width * 2`.
    pub fn line_bytes(&self, y: usize, out: &mut [u8]) -> Option<usize> {
        let line = self.line(y)?;
        let len = line.len() * 2;
        let out = out.get_mut(..len)?;
        for (bytes, word) in out.chunks_exact_mut(2).zip(line) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
        Some(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_pixel_is_ignored() {
        let mut fb = FrameBuffer::new(4, 3, PixelOrder::Rgb);

        assert!(!fb.set_pixel(4, 0, 0xFFFF));
        assert!(!fb.set_pixel(0, 3, 0xFFFF));
        assert!(fb.words().iter().all(|w| *w == 0));
        assert_eq!(fb.pixel(4, 3), None);
    }

    #[test]
    fn blit_packs_and_clips() {
        let mut fb = FrameBuffer::new(2, 2, PixelOrder::Rgb);
        // 3x1 source: red, green, blue.
        let rgb = [255, 0, 0, 0, 255, 0, 0, 0, 255];

        assert!(fb.blit_rgb888(&rgb, 3, 1));
        assert_eq!(fb.line(0), Some(&[0xF800, 0x07E0][..]));
        assert_eq!(fb.line(1), Some(&[0, 0][..]));
    }

    #[test]
    fn blit_rejects_short_source() {
        let mut fb = FrameBuffer::new(2, 2, PixelOrder::Bgr);
        assert!(!fb.blit_rgb888(&[0; 11], 2, 2));
    }

    #[test]
    fn line_bytes_are_little_endian() {
        let mut fb = FrameBuffer::new(2, 1, PixelOrder::Bgr);
        fb.set_pixel(0, 0, 0x1234);
        fb.set_pixel(1, 0, 0xABCD);

        let mut out = [0u8; 5];
        assert_eq!(fb.line_bytes(0, &mut out), Some(4));
        assert_eq!(out, [0x34, 0x12, 0xCD, 0xAB, 0]);
        assert_eq!(fb.line_bytes(0, &mut out[..3]), None);
        assert_eq!(fb.line_bytes(1, &mut out), None);
    }
}
