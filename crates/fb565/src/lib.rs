#![cfg_attr(not(test), no_std)]

//! RGB565 framebuffer and a line-oriented panel writer.

extern crate alloc;

mod framebuffer;
pub mod pixel;

pub use framebuffer::FrameBuffer;
pub use pixel::{PixelOrder, pack_bgr565, pack_rgb565, unpack_rgb565};

use alloc::{vec, vec::Vec};

use log::trace;

/// Byte-addressed destination for panel lines.
pub trait LineSink {
    type Error;

    /// Writes `bytes` at byte `offset` from the start of video memory.
    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Called after the last line of a frame.
    fn finish_frame(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Panel geometry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    pub width: usize,
    pub height: usize,
    /// Bytes between the starts of consecutive lines.
    pub stride: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            stride: 320 * 2,
        }
    }
}

impl Config {
    /// Geometry with a tightly packed stride.
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stride: width * 2,
        }
    }

    pub const fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<SinkErr> {
    /// Sink write failed.
    Sink(SinkErr),
    /// Buffer geometry does not match the panel.
    InvalidInput,
}

pub type PanelResult<SinkErr> = Result<(), Error<SinkErr>>;

/// Writes [`FrameBuffer`]s to a [`LineSink`].
#[derive(Debug)]
pub struct FbPanel<S> {
    sink: S,
    config: Config,
    line: Vec<u8>,
}

impl<S> FbPanel<S>
where
    S: LineSink,
{
    pub fn new(sink: S, config: Config) -> Result<Self, Error<S::Error>> {
        if config.width == 0 || config.height == 0 || config.stride < config.width * 2 {
            return Err(Error::InvalidInput);
        }
        Ok(Self {
            sink,
            config,
            line: vec![0; config.width * 2],
        })
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Releases the sink.
    pub fn release(self) -> S {
        self.sink
    }

    /// Framebuffer matching this panel.
    pub fn frame_buffer(&self, order: PixelOrder) -> FrameBuffer {
        FrameBuffer::new(self.config.width, self.config.height, order)
    }

    /// Writes line `y` of `buffer`.
    pub fn write_line(&mut self, y: usize, buffer: &FrameBuffer) -> PanelResult<S::Error> {
        self.check(buffer)?;
        let len = buffer
            .line_bytes(y, &mut self.line)
            .ok_or(Error::InvalidInput)?;
        self.sink
            .write_at(y * self.config.stride, &self.line[..len])
            .map_err(Error::Sink)
    }

    /// Writes every line of `buffer`.
    pub fn flush_full(&mut self, buffer: &FrameBuffer) -> PanelResult<S::Error> {
        self.check(buffer)?;
        for y in 0..self.config.height {
            self.write_line(y, buffer)?;
        }
        self.sink.finish_frame().map_err(Error::Sink)?;
        trace!("fb565: flushed lines={}", self.config.height);
        Ok(())
    }

    fn check(&self, buffer: &FrameBuffer) -> PanelResult<S::Error> {
        if buffer.width() != self.config.width || buffer.height() != self.config.height {
            return Err(Error::InvalidInput);
        }
        Ok(())
    }
}
