//! Settings snapshot persisted as one checksummed record on a storage device.
//!
//! Layout (little endian):
//!
//! | bytes | field |
//! |-------|-------|
//! | 4 | magic `TVS1` |
//! | 1 | version |
//! | 1 | entry count |
//! | .. | entries: `name_len`, name, tag, payload |
//! | 4 | FNV-1a over everything above |
//!
//! Payloads are an `f32` for tag 0 and `len` + UTF-8 bytes for tag 1.

use embedded_storage::{ReadStorage, Storage};
use log::{debug, warn};
use thermview_core::settings::{
    MAX_SNAPSHOT_ENTRIES, NAME_CAPACITY, OPTION_CAPACITY, SettingsBackend, SettingsSnapshot,
    SnapshotValue,
};

const RECORD_MAGIC: u32 = 0x3153_5654; // "TVS1"
const RECORD_VERSION: u8 = 1;
const HEADER_LEN: usize = 6;
const CHECKSUM_LEN: usize = 4;
const TAG_NUMBER: u8 = 0;
const TAG_OPTION: u8 = 1;
const MAX_ENTRY_LEN: usize = 1 + NAME_CAPACITY + 1 + 1 + OPTION_CAPACITY;

/// Bytes reserved on the device for the record.
pub const RECORD_CAPACITY: usize = HEADER_LEN + MAX_SNAPSHOT_ENTRIES * MAX_ENTRY_LEN + CHECKSUM_LEN;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SettingsRecordError<E> {
    Storage(E),
    /// The record region does not fit on the device.
    OutOfBounds,
    /// Checksum mismatch or truncated entry list.
    Corrupted,
}

/// [`SettingsBackend`] keeping the record at a fixed device offset.
#[derive(Debug)]
pub struct StorageSettingsBackend<S> {
    storage: S,
    offset: u32,
}

impl<S> StorageSettingsBackend<S>
where
    S: ReadStorage + Storage,
{
    pub fn new(storage: S, offset: u32) -> Result<Self, SettingsRecordError<S::Error>> {
        let end = offset as usize + RECORD_CAPACITY;
        if end > storage.capacity() {
            return Err(SettingsRecordError::OutOfBounds);
        }
        Ok(Self { storage, offset })
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}

impl<S> SettingsBackend for StorageSettingsBackend<S>
where
    S: ReadStorage + Storage,
{
    type Error = SettingsRecordError<S::Error>;

    fn load(&mut self) -> Result<Option<SettingsSnapshot>, Self::Error> {
        let mut buf = [0u8; RECORD_CAPACITY];
        self.storage
            .read(self.offset, &mut buf)
            .map_err(SettingsRecordError::Storage)?;

        if buf[..HEADER_LEN].iter().all(|b| *b == 0xFF) {
            return Ok(None);
        }

        let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != RECORD_MAGIC {
            debug!("settings-record: foreign magic={:#010x}", magic);
            return Ok(None);
        }
        if buf[4] != RECORD_VERSION {
            debug!("settings-record: unsupported version={}", buf[4]);
            return Ok(None);
        }

        decode(&buf).map(Some)
    }

    fn save(&mut self, snapshot: &SettingsSnapshot) -> Result<(), Self::Error> {
        let mut buf = [0xFFu8; RECORD_CAPACITY];
        let len = encode(snapshot, &mut buf);
        self.storage
            .write(self.offset, &buf[..len])
            .map_err(SettingsRecordError::Storage)?;
        debug!(
            "settings-record: saved entries={} bytes={}",
            snapshot.len(),
            len
        );
        Ok(())
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    fn byte(&mut self) -> Option<u8> {
        let b = *self.buf.get(self.at)?;
        self.at += 1;
        Some(b)
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.buf.get(self.at..self.at + len)?;
        self.at += len;
        Some(bytes)
    }
}

fn decode<E>(buf: &[u8]) -> Result<SettingsSnapshot, SettingsRecordError<E>> {
    let count = buf[5] as usize;
    let mut reader = Reader {
        buf,
        at: HEADER_LEN,
    };
    let mut snapshot = SettingsSnapshot::new();

    for _ in 0..count {
        let (name, value) = read_entry(&mut reader).ok_or(SettingsRecordError::Corrupted)?;
        let Ok(name) = core::str::from_utf8(name) else {
            warn!("settings-record: skip entry with invalid name");
            continue;
        };
        let pushed = match value {
            RawValue::Number(n) => snapshot.push_number(name, n),
            RawValue::Option(bytes) => match core::str::from_utf8(bytes) {
                Ok(option) => snapshot.push_option(name, option),
                Err(_) => {
                    warn!("settings-record: skip entry={} invalid option", name);
                    continue;
                }
            },
        };
        if pushed.is_err() {
            warn!("settings-record: skip entry={} does not fit", name);
        }
    }

    let body_len = reader.at;
    let stored = reader
        .take(CHECKSUM_LEN)
        .ok_or(SettingsRecordError::Corrupted)?;
    let expected = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
    if checksum32(&buf[..body_len]) != expected {
        return Err(SettingsRecordError::Corrupted);
    }

    Ok(snapshot)
}

enum RawValue<'a> {
    Number(f32),
    Option(&'a [u8]),
}

fn read_entry<'a>(reader: &mut Reader<'a>) -> Option<(&'a [u8], RawValue<'a>)> {
    let name_len = reader.byte()? as usize;
    let name = reader.take(name_len)?;
    let value = match reader.byte()? {
        TAG_NUMBER => {
            let raw = reader.take(4)?;
            RawValue::Number(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
        }
        TAG_OPTION => {
            let len = reader.byte()? as usize;
            RawValue::Option(reader.take(len)?)
        }
        _ => return None,
    };
    Some((name, value))
}

/// Writes the record into `buf` and returns its length.
fn encode(snapshot: &SettingsSnapshot, buf: &mut [u8; RECORD_CAPACITY]) -> usize {
    buf[0..4].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
    buf[4] = RECORD_VERSION;
    buf[5] = snapshot.len() as u8;

    let mut at = HEADER_LEN;
    let mut put = |bytes: &[u8], at: &mut usize| {
        buf[*at..*at + bytes.len()].copy_from_slice(bytes);
        *at += bytes.len();
    };

    // Snapshot capacities bound every entry to MAX_ENTRY_LEN bytes.
    for entry in snapshot.entries() {
        put(&[entry.name.len() as u8], &mut at);
        put(entry.name.as_bytes(), &mut at);
        match &entry.value {
            SnapshotValue::Number(n) => {
                put(&[TAG_NUMBER], &mut at);
                put(&n.to_le_bytes(), &mut at);
            }
            SnapshotValue::Option(option) => {
                put(&[TAG_OPTION, option.len() as u8], &mut at);
                put(option.as_bytes(), &mut at);
            }
        }
    }

    let checksum = checksum32(&buf[..at]);
    buf[at..at + CHECKSUM_LEN].copy_from_slice(&checksum.to_le_bytes());
    at + CHECKSUM_LEN
}

fn checksum32(bytes: &[u8]) -> u32 {
    let mut hash = 0x811C9DC5u32;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}
