//! Owned pixel buffers and the small geometry types shared by the pipeline.

use alloc::vec;
use alloc::vec::Vec;

/// Bytes per pixel of an [`Image`].
pub const CHANNELS: usize = 3;

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    pub const fn right(self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(self) -> u32 {
        self.y + self.height
    }

    /// `true` when the rectangle lies fully inside `bounds` anchored at the origin.
    pub const fn fits_in(self, bounds: Size) -> bool {
        self.right() <= bounds.width && self.bottom() <= bounds.height
    }
}

/// One RGB888 pixel.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Self = Self([0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub const fn r(self) -> u8 {
        self.0[0]
    }

    pub const fn g(self) -> u8 {
        self.0[1]
    }

    pub const fn b(self) -> u8 {
        self.0[2]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageError {
    /// Width or height is zero.
    ZeroSize,
    /// Raw buffer length does not match `width * height * channels`.
    BufferSize { expected: usize, actual: usize },
    /// Two images that must share dimensions do not.
    SizeMismatch { expected: Size, actual: Size },
}

/// RGB888 image, row-major, tightly packed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    size: Size,
    data: Vec<u8>,
}

impl Image {
    /// Creates a black image.
    pub fn new(size: Size) -> Result<Self, ImageError> {
        Self::filled(size, Rgb::BLACK)
    }

    pub fn filled(size: Size, color: Rgb) -> Result<Self, ImageError> {
        if size.is_empty() {
            return Err(ImageError::ZeroSize);
        }

        let mut data = vec![0u8; size.area() * CHANNELS];
        if color != Rgb::BLACK {
            for px in data.chunks_exact_mut(CHANNELS) {
                px.copy_from_slice(&color.0);
            }
        }

        Ok(Self { size, data })
    }

    pub fn from_raw(size: Size, data: Vec<u8>) -> Result<Self, ImageError> {
        if size.is_empty() {
            return Err(ImageError::ZeroSize);
        }

        let expected = size.area() * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { size, data })
    }

    /// Builds an image from parts already known to satisfy the invariants.
    pub(crate) fn from_parts(size: Size, data: Vec<u8>) -> Self {
        debug_assert!(!size.is_empty());
        debug_assert_eq!(data.len(), size.area() * CHANNELS);
        Self { size, data }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.size.width as usize + x as usize) * CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }

        let at = self.offset(x, y);
        Some(Rgb([self.data[at], self.data[at + 1], self.data[at + 2]]))
    }

    /// Writes a pixel. Returns `false` (and does nothing) when out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) -> bool {
        if x >= self.size.width || y >= self.size.height {
            return false;
        }

        let at = self.offset(x, y);
        self.data[at..at + CHANNELS].copy_from_slice(&color.0);
        true
    }

    pub fn fill(&mut self, color: Rgb) {
        if color.0[0] == color.0[1] && color.0[1] == color.0[2] {
            self.data.fill(color.0[0]);
            return;
        }

        for px in self.data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&color.0);
        }
    }

    /// Mutable RGB bytes of row `y`.
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.size.height {
            return None;
        }

        let stride = self.size.width as usize * CHANNELS;
        let start = y as usize * stride;
        Some(&mut self.data[start..start + stride])
    }

    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.size.height {
            return None;
        }

        let stride = self.size.width as usize * CHANNELS;
        let start = y as usize * stride;
        Some(&self.data[start..start + stride])
    }

    /// Copies `src` so that its top-left corner lands on `(x, y)`.
    ///
    /// Parts falling outside this image are dropped.
    pub fn blit(&mut self, src: &Image, x: u32, y: u32) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }

        let copy_w = src.size.width.min(self.size.width - x) as usize;
        let copy_h = src.size.height.min(self.size.height - y);

        for row in 0..copy_h {
            let Some(src_row) = src.row(row) else {
                break;
            };
            let dst_start = self.offset(x, y + row);
            self.data[dst_start..dst_start + copy_w * CHANNELS]
                .copy_from_slice(&src_row[..copy_w * CHANNELS]);
        }
    }

    /// Flips the image around its vertical axis in place.
    pub fn mirror_horizontal(&mut self) {
        let width = self.size.width as usize;
        for y in 0..self.size.height {
            let Some(row) = self.row_mut(y) else {
                break;
            };
            for x in 0..width / 2 {
                let left = x * CHANNELS;
                let right = (width - 1 - x) * CHANNELS;
                for c in 0..CHANNELS {
                    row.swap(left + c, right + c);
                }
            }
        }
    }
}

/// Single-channel 8-bit image (sensor intensity plane).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GrayImage {
    size: Size,
    data: Vec<u8>,
}

impl GrayImage {
    pub fn new(size: Size) -> Result<Self, ImageError> {
        if size.is_empty() {
            return Err(ImageError::ZeroSize);
        }

        Ok(Self {
            size,
            data: vec![0u8; size.area()],
        })
    }

    pub fn from_raw(size: Size, data: Vec<u8>) -> Result<Self, ImageError> {
        if size.is_empty() {
            return Err(ImageError::ZeroSize);
        }
        if data.len() != size.area() {
            return Err(ImageError::BufferSize {
                expected: size.area(),
                actual: data.len(),
            });
        }

        Ok(Self { size, data })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn sample(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }

        Some(self.data[y as usize * self.size.width as usize + x as usize])
    }
}
