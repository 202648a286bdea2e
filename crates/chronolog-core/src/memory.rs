//! In-memory record store
//!
//! Used by tests and by embedders that want to inspect records without
//! touching disk. Handles cloned from one [`MemoryStore`] share the same
//! record vector, so a test can keep a reading handle while a writer owns
//! another.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::traits::store::{RecordRead, RecordStore, StoreOpener, StoreResult, StoreStats};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<Vec<u8>>>>,
    rejecting: Arc<AtomicBool>,
    max_record_size: usize,
    closed: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default().max_record_size)
    }
}

impl MemoryStore {
    pub fn new(max_record_size: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            rejecting: Arc::new(AtomicBool::new(false)),
            max_record_size,
            closed: false,
        }
    }

    /// A fresh, open handle onto the same records
    pub fn handle(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            rejecting: Arc::clone(&self.rejecting),
            max_record_size: self.max_record_size,
            closed: false,
        }
    }

    /// Make every handle fail its appends with an I/O error until reset
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Copy of every record, in append order
    pub fn records(&self) -> Vec<Vec<u8>> {
        self.records.read().clone()
    }
}

impl RecordRead for MemoryStore {
    fn read_at(&self, index: u64) -> StoreResult<Option<Vec<u8>>> {
        let records = self.records.read();
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| records.get(i))
            .cloned())
    }

    fn len(&self) -> StoreResult<u64> {
        Ok(self.records.read().len() as u64)
    }
}

impl RecordStore for MemoryStore {
    fn append(&mut self, record: &[u8]) -> StoreResult<u64> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if record.len() > self.max_record_size {
            return Err(StoreError::RecordTooLarge {
                size: record.len(),
                max: self.max_record_size,
            });
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "memory store is rejecting appends",
            )));
        }

        let mut records = self.records.write();
        records.push(record.to_vec());
        Ok(records.len() as u64 - 1)
    }

    fn sync(&mut self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        let records = self.records.read();
        Ok(StoreStats {
            record_count: records.len() as u64,
            total_bytes: records.iter().map(|r| r.len() as u64).sum(),
            file_count: 0,
        })
    }
}

/// Opens [`MemoryStore`]s keyed by path and counts the opens.
///
/// Reopening a path yields a new handle onto the records written so far,
/// the way reopening a file store would.
#[derive(Debug, Default)]
pub struct MemoryStoreOpener {
    stores: Mutex<HashMap<PathBuf, MemoryStore>>,
    opens: Mutex<HashMap<PathBuf, usize>>,
    open_delay: Option<Duration>,
}

impl MemoryStoreOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every open, widening race windows in tests
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Reading handle for a path that has been opened at least once
    pub fn store(&self, path: &Path) -> Option<MemoryStore> {
        self.stores.lock().get(path).map(MemoryStore::handle)
    }

    pub fn open_count(&self, path: &Path) -> usize {
        self.opens.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_opens(&self) -> usize {
        self.opens.lock().values().sum()
    }
}

impl StoreOpener for MemoryStoreOpener {
    fn open(&self, path: &Path, config: &StoreConfig) -> StoreResult<Box<dyn RecordStore>> {
        if let Some(delay) = self.open_delay {
            std::thread::sleep(delay);
        }

        *self.opens.lock().entry(path.to_path_buf()).or_insert(0) += 1;

        let store = self
            .stores
            .lock()
            .entry(path.to_path_buf())
            .or_insert_with(|| MemoryStore::new(config.max_record_size))
            .handle();

        Ok(Box::new(store))
    }
}
