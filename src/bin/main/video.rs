use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info};
use thermview_core::{
    frame::{FrameError, FrameSource, decode_yuyv_luma, yuyv_frame_len},
    image::{GrayImage, Size},
};

#[derive(Debug, thiserror::Error)]
pub(super) enum VideoError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error("bad frame: {0:?}")]
    Frame(FrameError),
}

/// Packed YUYV frames read from a capture device or a recorded file.
///
/// Recorded files are replayed from the start once exhausted.
pub(super) struct YuyvSource {
    path: PathBuf,
    file: File,
    size: Size,
    raw: Vec<u8>,
}

impl YuyvSource {
    pub(super) fn open(path: &Path, size: Size) -> Result<Self> {
        let file = open_device(path)?;
        info!("video: opened path={} size={}x{}", path.display(), size.width, size.height);
        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
            raw: vec![0; yuyv_frame_len(size)],
        })
    }

    /// Reopens the device so the stream restarts on a frame boundary.
    pub(super) fn resync(&mut self) -> Result<()> {
        self.file = open_device(&self.path)?;
        debug!("video: resynced path={}", self.path.display());
        Ok(())
    }

    fn fill_frame(&mut self) -> io::Result<()> {
        match self.file.read_exact(&mut self.raw) {
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                // Recordings loop; capture devices fail the seek.
                self.file.seek(SeekFrom::Start(0))?;
                self.file.read_exact(&mut self.raw)
            }
            other => other,
        }
    }
}

impl FrameSource for YuyvSource {
    type Error = VideoError;

    fn frame_size(&self) -> Size {
        self.size
    }

    fn read_frame(&mut self) -> Result<GrayImage, Self::Error> {
        self.fill_frame()?;
        decode_yuyv_luma(&self.raw, self.size).map_err(VideoError::Frame)
    }
}

fn open_device(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("opening video source {}", path.display()))
}
