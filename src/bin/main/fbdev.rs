use std::{
    fs::{self, File, OpenOptions},
    io,
    os::unix::fs::FileExt,
    path::Path,
};

use anyhow::{Context, Result, bail};
use fb565::LineSink;
use log::info;

const SUPPORTED_BPP: u32 = 16;

/// Visible geometry of a Linux framebuffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct FbGeometry {
    pub(super) width: usize,
    pub(super) height: usize,
    pub(super) bits_per_pixel: u32,
}

impl FbGeometry {
    /// Reads `virtual_size` and `bits_per_pixel` from the device's sysfs node.
    pub(super) fn from_sysfs(sysfs_dir: &Path) -> Result<Self> {
        let size = read_attr(sysfs_dir, "virtual_size")?;
        let bpp = read_attr(sysfs_dir, "bits_per_pixel")?;
        let geometry = Self::parse(&size, &bpp)?;
        info!(
            "fbdev: geometry {}x{} bpp={}",
            geometry.width, geometry.height, geometry.bits_per_pixel
        );
        Ok(geometry)
    }

    fn parse(virtual_size: &str, bits_per_pixel: &str) -> Result<Self> {
        let (w, h) = virtual_size
            .trim()
            .split_once(',')
            .with_context(|| format!("malformed virtual_size {virtual_size:?}"))?;
        let geometry = Self {
            width: w.trim().parse().context("virtual_size width")?,
            height: h.trim().parse().context("virtual_size height")?,
            bits_per_pixel: bits_per_pixel.trim().parse().context("bits_per_pixel")?,
        };

        if geometry.bits_per_pixel != SUPPORTED_BPP {
            bail!(
                "framebuffer uses {} bits per pixel, only {} is supported",
                geometry.bits_per_pixel,
                SUPPORTED_BPP
            );
        }
        if geometry.width == 0 || geometry.height == 0 {
            bail!("framebuffer reports an empty geometry");
        }
        Ok(geometry)
    }

    pub(super) fn stride(&self) -> usize {
        self.width * (self.bits_per_pixel as usize / 8)
    }
}

fn read_attr(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

/// Framebuffer device written line by line with positioned writes.
#[derive(Debug)]
pub(super) struct FbDevice {
    file: File,
}

impl FbDevice {
    pub(super) fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .with_context(|| format!("opening framebuffer {}", path.display()))?;
        Ok(Self { file })
    }
}

impl LineSink for FbDevice {
    type Error = io::Error;

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Self::Error> {
        self.file.write_all_at(bytes, offset as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sysfs_values() {
        let geometry = FbGeometry::parse("480,320\n", "16\n").unwrap();

        assert_eq!(geometry.width, 480);
        assert_eq!(geometry.height, 320);
        assert_eq!(geometry.stride(), 960);
    }

    #[test]
    fn rejects_other_depths() {
        let err = FbGeometry::parse("480,320", "32").unwrap_err();
        assert!(err.to_string().contains("32 bits per pixel"));
    }

    #[test]
    fn rejects_malformed_size() {
        assert!(FbGeometry::parse("480x320", "16").is_err());
        assert!(FbGeometry::parse("0,320", "16").is_err());
    }
}
