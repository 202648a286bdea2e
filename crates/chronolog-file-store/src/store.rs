use crate::segment::{self, ActiveSegment, SegmentInfo, StoreResult, INDEXED_SEGMENT};
use chrono::{DateTime, Utc};
use chronolog_core::{
    config::{StorageKind, StoreConfig},
    error::StoreError,
    traits::{RecordRead, RecordStore, StoreOpener, StoreStats},
};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File-backed record store
///
/// Indexed stores keep every record in one data/index pair. Rolling stores
/// start a new pair whenever the UTC roll cycle changes; record indices stay
/// global across pairs.
pub struct FileRecordStore {
    dir: PathBuf,
    config: StoreConfig,
    /// Completed segments, oldest first
    sealed: Vec<SegmentInfo>,
    active: Option<ActiveSegment>,
    closed: bool,
    /// Set when a failed append could not be rolled back
    broken: bool,
}

impl FileRecordStore {
    /// Open or create a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>, config: StoreConfig) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut sealed = segment::scan(&dir)?;
        let active = match config.kind {
            StorageKind::Indexed => {
                sealed.retain(|s| s.name != INDEXED_SEGMENT);
                Some(ActiveSegment::open(&dir, INDEXED_SEGMENT)?)
            }
            StorageKind::Rolling => {
                let current = config.roll_cycle.cycle_name(Utc::now());
                if sealed.last().is_some_and(|s| s.name == current) {
                    sealed.pop();
                    Some(ActiveSegment::open(&dir, &current)?)
                } else {
                    None
                }
            }
        };

        tracing::debug!(
            "Opened {:?} record store at {} ({} sealed segments)",
            config.kind,
            dir.display(),
            sealed.len()
        );

        Ok(Self {
            dir,
            config,
            sealed,
            active,
            closed: false,
            broken: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn sealed_count(&self) -> u64 {
        self.sealed.iter().map(|s| s.count).sum()
    }

    /// Make sure the active segment matches the roll cycle of `now`
    fn roll_if_needed(&mut self, now: DateTime<Utc>) -> StoreResult<()> {
        let mut wanted = match self.config.kind {
            StorageKind::Indexed => return Ok(()),
            StorageKind::Rolling => self.config.roll_cycle.cycle_name(now),
        };

        // Never roll backwards: a clock step back keeps writing the newest segment.
        match &self.active {
            Some(active) if active.name >= wanted => return Ok(()),
            Some(_) => {}
            None => {
                if let Some(last) = self.sealed.last() {
                    if last.name >= wanted {
                        wanted = last.name.clone();
                        self.sealed.pop();
                    }
                }
            }
        }

        let next = ActiveSegment::open(&self.dir, &wanted)?;
        if let Some(mut previous) = self.active.replace(next) {
            previous.data.flush()?;
            tracing::info!(
                "Rolled record store {}: {} -> {}",
                self.dir.display(),
                previous.name,
                wanted
            );
            self.sealed.push(SegmentInfo {
                name: previous.name,
                count: previous.count,
            });
        }
        Ok(())
    }

    /// Append as of `now`; rolling stores pick their segment from it
    pub(crate) fn append_at(&mut self, record: &[u8], now: DateTime<Utc>) -> StoreResult<u64> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if self.broken {
            return Err(StoreError::Corrupt(format!(
                "store {} has an unrecovered partial append, reopen it to repair",
                self.dir.display()
            )));
        }
        if record.len() > self.config.max_record_size || record.len() > u32::MAX as usize {
            return Err(StoreError::RecordTooLarge {
                size: record.len(),
                max: self.config.max_record_size,
            });
        }

        self.roll_if_needed(now)?;
        let base = self.sealed_count();
        let sync = self.config.sync_on_append;
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| StoreError::Corrupt("no active segment".into()))?;

        let mut entry = Vec::with_capacity(segment::DATA_HEADER_BYTES as usize + record.len());
        entry.extend_from_slice(&(record.len() as u32).to_be_bytes());
        entry.extend_from_slice(record);

        if let Err(e) = active.write_entry(&entry, sync) {
            if let Err(undo) = active.rollback() {
                tracing::error!(
                    "Could not roll back failed append to segment {} of {}: {}",
                    active.name,
                    self.dir.display(),
                    undo
                );
                self.broken = true;
            }
            return Err(e.into());
        }

        active.data_len += entry.len() as u64;
        active.count += 1;
        Ok(base + active.count - 1)
    }

    fn segments(&self) -> Vec<SegmentInfo> {
        let mut segments = self.sealed.clone();
        if let Some(active) = &self.active {
            segments.push(SegmentInfo {
                name: active.name.clone(),
                count: active.count,
            });
        }
        segments
    }
}

impl RecordRead for FileRecordStore {
    fn read_at(&self, index: u64) -> StoreResult<Option<Vec<u8>>> {
        let segments = self.segments();
        match segment::locate(&segments, index) {
            Some((pos, local)) => segment::read_record(
                &self.dir,
                &segments[pos].name,
                local,
                self.config.max_record_size,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn len(&self) -> StoreResult<u64> {
        Ok(self.sealed_count() + self.active.as_ref().map_or(0, |a| a.count))
    }
}

impl RecordStore for FileRecordStore {
    fn append(&mut self, record: &[u8]) -> StoreResult<u64> {
        self.append_at(record, Utc::now())
    }

    fn sync(&mut self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if let Some(active) = self.active.as_mut() {
            active.data.flush()?;
            active.data.sync_all()?;
            active.index.sync_all()?;
        }
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.sync();
        self.closed = true;
        if let Some(active) = self.active.take() {
            self.sealed.push(SegmentInfo {
                name: active.name,
                count: active.count,
            });
        }
        tracing::debug!("Closed record store {}", self.dir.display());
        result
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        let segments = self.segments();
        let mut total_bytes = 0u64;
        let mut file_count = 0usize;

        for s in &segments {
            let data = segment::data_path(&self.dir, &s.name);
            if data.exists() {
                total_bytes += std::fs::metadata(&data)?.len();
                file_count += 1;
            }
            let index = segment::index_path(&self.dir, &s.name);
            if index.exists() {
                total_bytes += std::fs::metadata(&index)?.len();
            }
        }

        Ok(StoreStats {
            record_count: segments.iter().map(|s| s.count).sum(),
            total_bytes,
            file_count,
        })
    }
}

/// Ensure data reaches disk on drop
impl Drop for FileRecordStore {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.sync() {
            tracing::warn!(
                "Failed to sync record store {} on drop: {}",
                self.dir.display(),
                e
            );
        }
    }
}

/// Opens [`FileRecordStore`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStoreOpener;

impl StoreOpener for FileStoreOpener {
    fn open(&self, path: &Path, config: &StoreConfig) -> StoreResult<Box<dyn RecordStore>> {
        Ok(Box::new(FileRecordStore::open(path, config.clone())?))
    }
}
