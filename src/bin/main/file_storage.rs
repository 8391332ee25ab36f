use std::{
    fs::{File, OpenOptions},
    io,
    os::unix::fs::FileExt,
    path::Path,
};

use anyhow::{Context, Result};
use embedded_storage::{ReadStorage, Storage};

/// Fixed-size file standing in for a flash partition.
///
/// Bytes past the end of the file read as erased (`0xFF`).
#[derive(Debug)]
pub(super) struct FileStorage {
    file: File,
    capacity: usize,
}

impl FileStorage {
    pub(super) fn open(path: &Path, capacity: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("opening settings store {}", path.display()))?;
        Ok(Self { file, capacity })
    }

    fn check_bounds(&self, offset: u32, len: usize) -> io::Result<()> {
        if offset as usize + len > self.capacity {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "access past end of settings store",
            ));
        }
        Ok(())
    }
}

impl ReadStorage for FileStorage {
    type Error = io::Error;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.check_bounds(offset, bytes.len())?;
        bytes.fill(0xFF);

        let mut filled = 0;
        while filled < bytes.len() {
            let n = self
                .file
                .read_at(&mut bytes[filled..], u64::from(offset) + filled as u64)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Storage for FileStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        self.check_bounds(offset, bytes.len())?;
        self.file.write_all_at(bytes, u64::from(offset))?;
        self.file.sync_data()
    }
}
