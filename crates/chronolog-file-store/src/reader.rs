use crate::segment::{self, SegmentInfo, StoreResult};
use chronolog_core::{config::StoreConfig, traits::RecordRead};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Read-only view of a file record store
///
/// Safe to use while a [`FileRecordStore`](crate::FileRecordStore) appends to
/// the same directory: only records with a complete index entry are visible,
/// and the segment list is rescanned when a read runs past the known end.
pub struct FileRecordReader {
    dir: PathBuf,
    max_record_size: usize,
    segments: Mutex<Vec<SegmentInfo>>,
}

impl FileRecordReader {
    pub fn open(dir: impl Into<PathBuf>, config: &StoreConfig) -> StoreResult<Self> {
        let dir = dir.into();
        let segments = segment::scan(&dir)?;
        Ok(Self {
            dir,
            max_record_size: config.max_record_size,
            segments: Mutex::new(segments),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rescan segments, picking up records appended since the last scan
    pub fn refresh(&self) -> StoreResult<()> {
        let fresh = segment::scan(&self.dir)?;
        *self.segments.lock() = fresh;
        Ok(())
    }

    fn lookup(&self, index: u64) -> Option<(String, u64)> {
        let segments = self.segments.lock();
        segment::locate(&segments, index).map(|(pos, local)| (segments[pos].name.clone(), local))
    }
}

impl RecordRead for FileRecordReader {
    fn read_at(&self, index: u64) -> StoreResult<Option<Vec<u8>>> {
        let found = match self.lookup(index) {
            Some(found) => Some(found),
            None => {
                self.refresh()?;
                self.lookup(index)
            }
        };

        match found {
            Some((name, local)) => {
                segment::read_record(&self.dir, &name, local, self.max_record_size).map(Some)
            }
            None => Ok(None),
        }
    }

    fn len(&self) -> StoreResult<u64> {
        self.refresh()?;
        Ok(self.segments.lock().iter().map(|s| s.count).sum())
    }
}
