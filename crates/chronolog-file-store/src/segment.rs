//! On-disk segment layout
//!
//! A segment is a pair of files named after the segment:
//! - `<name>.data`: records as `[size: u32][bytes]`, big-endian
//! - `<name>.index`: one `u64` data offset per record, big-endian
//!
//! The index entry is written after the data entry, so a record is visible
//! exactly when its index entry is complete.

use chronolog_core::error::StoreError;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub(crate) const INDEX_ENTRY_BYTES: u64 = 8;
pub(crate) const DATA_HEADER_BYTES: u64 = 4;

const DATA_EXT: &str = "data";
const INDEX_EXT: &str = "index";

/// Segment name used by indexed stores
pub(crate) const INDEXED_SEGMENT: &str = "records";

pub(crate) use chronolog_core::traits::store::StoreResult;

/// A segment and how many records it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SegmentInfo {
    pub name: String,
    pub count: u64,
}

pub(crate) fn data_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, DATA_EXT))
}

pub(crate) fn index_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, INDEX_EXT))
}

/// Names of all segments in `dir`, in time order
pub(crate) fn list_segments(dir: &Path) -> StoreResult<Vec<String>> {
    let mut names = Vec::new();
    if !dir.exists() {
        return Ok(names);
    }

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(INDEX_EXT) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }

    names.sort();
    Ok(names)
}

/// Number of complete index entries in a segment
pub(crate) fn indexed_count(dir: &Path, name: &str) -> StoreResult<u64> {
    match std::fs::metadata(index_path(dir, name)) {
        Ok(meta) => Ok(meta.len() / INDEX_ENTRY_BYTES),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Scan `dir` into segment infos
pub(crate) fn scan(dir: &Path) -> StoreResult<Vec<SegmentInfo>> {
    list_segments(dir)?
        .into_iter()
        .map(|name| {
            let count = indexed_count(dir, &name)?;
            Ok(SegmentInfo { name, count })
        })
        .collect()
}

/// Map a global record index to `(segment position, local index)`
pub(crate) fn locate(segments: &[SegmentInfo], index: u64) -> Option<(usize, u64)> {
    let mut base = 0u64;
    for (pos, segment) in segments.iter().enumerate() {
        if index < base + segment.count {
            return Some((pos, index - base));
        }
        base += segment.count;
    }
    None
}

fn read_u64_at(file: &mut File, offset: u64) -> StoreResult<u64> {
    let mut buf = [0u8; 8];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

fn read_u32_at(file: &mut File, offset: u64) -> StoreResult<u32> {
    let mut buf = [0u8; 4];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Data offset of record `local` in a segment
pub(crate) fn record_offset(dir: &Path, name: &str, local: u64) -> StoreResult<u64> {
    let mut index = File::open(index_path(dir, name))?;
    read_u64_at(&mut index, local * INDEX_ENTRY_BYTES)
}

/// Read record `local` of a segment
pub(crate) fn read_record(
    dir: &Path,
    name: &str,
    local: u64,
    max_record_size: usize,
) -> StoreResult<Vec<u8>> {
    let offset = record_offset(dir, name, local)?;
    let mut data = File::open(data_path(dir, name))?;
    let size = read_u32_at(&mut data, offset)? as usize;

    if size > max_record_size {
        return Err(StoreError::Corrupt(format!(
            "record {} of segment {} claims {} bytes, max_record_size is {}",
            local, name, size, max_record_size
        )));
    }

    let mut record = vec![0u8; size];
    data.read_exact(&mut record).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            StoreError::Corrupt(format!("record {} of segment {} is truncated", local, name))
        } else {
            StoreError::Io(e)
        }
    })?;
    Ok(record)
}

/// Files of the segment currently receiving appends
pub(crate) struct ActiveSegment {
    pub name: String,
    pub data: File,
    pub index: File,
    /// Length of the data file up to the last committed record
    pub data_len: u64,
    /// Committed records in this segment
    pub count: u64,
}

impl ActiveSegment {
    /// Open a segment for appending, dropping any torn tail left by a crash
    pub fn open(dir: &Path, name: &str) -> StoreResult<Self> {
        let mut data = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(data_path(dir, name))?;
        let index = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(index_path(dir, name))?;

        let data_file_len = data.metadata()?.len();
        let mut count = index.metadata()?.len() / INDEX_ENTRY_BYTES;
        let mut data_len = 0;

        // Walk back past index entries whose data never fully landed.
        let mut index_reader = File::open(index_path(dir, name))?;
        while count > 0 {
            let offset = read_u64_at(&mut index_reader, (count - 1) * INDEX_ENTRY_BYTES)?;
            if offset + DATA_HEADER_BYTES <= data_file_len {
                let size = read_u32_at(&mut data, offset)? as u64;
                let end = offset + DATA_HEADER_BYTES + size;
                if end <= data_file_len {
                    data_len = end;
                    break;
                }
            }
            count -= 1;
        }

        let index_len = count * INDEX_ENTRY_BYTES;
        if index.metadata()?.len() != index_len {
            tracing::warn!(
                "Truncating torn index tail of segment {} to {} records",
                name,
                count
            );
            index.set_len(index_len)?;
        }
        if data_file_len != data_len {
            tracing::warn!(
                "Truncating torn data tail of segment {} from {} to {} bytes",
                name,
                data_file_len,
                data_len
            );
            data.set_len(data_len)?;
        }

        Ok(Self {
            name: name.to_string(),
            data,
            index,
            data_len,
            count,
        })
    }
    /// Write one data entry and its index entry, syncing both when asked
    pub fn write_entry(&mut self, entry: &[u8], sync: bool) -> std::io::Result<()> {
        self.data.write_all(entry)?;
        self.index.write_all(&self.data_len.to_be_bytes())?;
        if sync {
            self.data.sync_data()?;
            self.index.sync_data()?;
        }
        Ok(())
    }

    /// Cut both files back to the last committed record
    pub fn rollback(&mut self) -> std::io::Result<()> {
        let index = self.index.set_len(self.count * INDEX_ENTRY_BYTES);
        let data = self.data.set_len(self.data_len);
        index.and(data)
    }
}
