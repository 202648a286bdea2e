//! Record store interface
//!
//! A store is an append-only sequence of opaque byte records addressed by a
//! zero-based index. The log writer owns the writing handle; readers open
//! their own read-only view.

use crate::config::StoreConfig;
use crate::error::StoreError;
use std::path::Path;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Random access to stored records
pub trait RecordRead: Send {
    /// Read the record at `index`, or `None` past the end
    fn read_at(&self, index: u64) -> StoreResult<Option<Vec<u8>>>;

    /// Number of readable records
    fn len(&self) -> StoreResult<u64>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Writing handle to a record store
pub trait RecordStore: RecordRead {
    /// Append one record, returning its index
    ///
    /// Appends are all-or-nothing: on error no partial record is visible to
    /// readers and earlier records are untouched.
    fn append(&mut self, record: &[u8]) -> StoreResult<u64>;

    /// Flush buffered data to durable storage
    fn sync(&mut self) -> StoreResult<()>;

    /// Release the handle; repeated calls are no-ops
    fn close(&mut self) -> StoreResult<()>;

    fn is_closed(&self) -> bool;

    fn stats(&self) -> StoreResult<StoreStats>;
}

/// Opens writing handles for store paths
pub trait StoreOpener: Send + Sync {
    fn open(&self, path: &Path, config: &StoreConfig) -> StoreResult<Box<dyn RecordStore>>;
}

/// Statistics about a record store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of records
    pub record_count: u64,

    /// Total bytes used by data and index files
    pub total_bytes: u64,

    /// Number of data files
    pub file_count: usize,
}

impl<S: RecordRead + ?Sized> RecordRead for Box<S> {
    fn read_at(&self, index: u64) -> StoreResult<Option<Vec<u8>>> {
        (**self).read_at(index)
    }

    fn len(&self) -> StoreResult<u64> {
        (**self).len()
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn append(&mut self, record: &[u8]) -> StoreResult<u64> {
        (**self).append(record)
    }

    fn sync(&mut self) -> StoreResult<()> {
        (**self).sync()
    }

    fn close(&mut self) -> StoreResult<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        (**self).stats()
    }
}
