use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::SyncMode;
use crate::error::{LogError, Result};
use crate::record::LogPosition;

/// Header size: 4 bytes length + 4 bytes CRC.
pub(crate) const HEADER_SIZE: u64 = 8;

/// A single append-only segment file of CRC-framed records.
///
/// On-disk format, repeated once per record:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (JSON-encoded LogRecord)]
/// ```
///
/// Opening scans the file front to back and indexes every intact frame.
/// The first frame that is short, zero-length or fails its CRC ends the
/// valid prefix; everything after it is a torn write and is truncated, so
/// positions stay dense.
pub(crate) struct Segment {
    file: File,
    offsets: Vec<u64>,
    end: u64,
    sync_mode: SyncMode,
}

impl Segment {
    pub(crate) fn open(path: &Path, sync_mode: SyncMode) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;

        let file_len = file.metadata()?.len();
        let (offsets, end) = scan(&mut file, file_len)?;
        if end < file_len {
            warn!(
                path = %path.display(),
                valid = end,
                file_len,
                "torn tail in log segment; truncating"
            );
            file.set_len(end)?;
            file.sync_all()?;
        }

        debug!(path = %path.display(), records = offsets.len(), "segment opened");
        Ok(Self {
            file,
            offsets,
            end,
            sync_mode,
        })
    }

    /// Append one payload and return its position.
    pub(crate) fn append(&mut self, payload: &[u8]) -> Result<LogPosition> {
        let length = u32::try_from(payload.len())
            .map_err(|_| LogError::Serialization("record exceeds 4 GiB".into()))?;
        let crc = crc32fast::hash(payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE as usize + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(payload);

        self.file.seek(SeekFrom::Start(self.end))?;
        self.file.write_all(&frame)?;
        self.file.flush()?;
        if matches!(self.sync_mode, SyncMode::EveryWrite) {
            self.file.sync_data()?;
        }

        let position = self.offsets.len() as LogPosition;
        self.offsets.push(self.end);
        self.end += frame.len() as u64;
        Ok(position)
    }

    /// Read the payload stored at `position`, re-checking its CRC.
    pub(crate) fn read(&mut self, position: LogPosition) -> Result<Vec<u8>> {
        let offset = *self
            .offsets
            .get(position as usize)
            .ok_or_else(|| LogError::Corrupt {
                position,
                reason: "position beyond end of segment".into(),
            })?;

        self.file.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; HEADER_SIZE as usize];
        self.file.read_exact(&mut header)?;
        let (length, expected_crc) = split_header(&header);

        let mut payload = vec![0u8; length as usize];
        self.file.read_exact(&mut payload)?;
        if crc32fast::hash(&payload) != expected_crc {
            return Err(LogError::Corrupt {
                position,
                reason: "CRC mismatch".into(),
            });
        }
        Ok(payload)
    }

    pub(crate) fn len(&self) -> u64 {
        self.offsets.len() as u64
    }
}

fn split_header(header: &[u8; HEADER_SIZE as usize]) -> (u32, u32) {
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    (length, crc)
}

/// Index the intact frames of `file`; returns their offsets and the end of
/// the valid prefix.
fn scan(file: &mut File, file_len: u64) -> Result<(Vec<u64>, u64)> {
    let mut offsets = Vec::new();
    let mut offset = 0u64;
    file.seek(SeekFrom::Start(0))?;

    while offset + HEADER_SIZE <= file_len {
        let mut header = [0u8; HEADER_SIZE as usize];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let (length, expected_crc) = split_header(&header);

        if length == 0 || offset + HEADER_SIZE + length as u64 > file_len {
            warn!(offset, length, file_len, "invalid frame length; ending scan");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match file.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; ending scan"
            );
            break;
        }

        offsets.push(offset);
        offset += HEADER_SIZE + length as u64;
    }

    Ok((offsets, offset))
}
