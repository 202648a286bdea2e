//! Log writers
//!
//! A writer owns one store handle and turns events into records through a
//! codec. [`BareWriter`] relies on `&mut self` for exclusive access;
//! [`SynchronizedWriter`] wraps any writer in a mutex so it can be shared
//! across threads. The registry hands out [`SharedWriter`]s.

use chronolog_core::{
    error::{Result, WriteError},
    observe, LogCodec, LogEvent, RecordFormat, RecordRead, RecordStore,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Appends encoded events to a record store
pub trait LogWriter: Send {
    /// Encode `event` and append it as one record
    fn append(&mut self, event: &LogEvent) -> Result<()>;

    /// Release the store handle; repeated calls are no-ops
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// Writer without internal locking
pub struct BareWriter<S, C> {
    store: S,
    codec: C,
    closed: bool,
}

impl<S: RecordStore, C: LogCodec> BareWriter<S, C> {
    pub fn new(store: S, codec: C) -> Self {
        Self {
            store,
            codec,
            closed: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }
}

impl<S: RecordStore, C: LogCodec> LogWriter for BareWriter<S, C> {
    fn append(&mut self, event: &LogEvent) -> Result<()> {
        if self.closed {
            return Err(WriteError::Closed.into());
        }

        let start = Instant::now();
        let record = self.codec.encode(event)?;
        let result = self.store.append(&record);
        observe::record_append(start.elapsed(), result.is_ok());

        result.map(|_| ()).map_err(|e| WriteError::Store(e).into())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.store.close().map_err(|e| WriteError::Store(e).into())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Serializes access to an inner writer
///
/// The lock is held for the whole encode and append, so records appear in
/// the order `append` calls complete.
pub struct SynchronizedWriter<W> {
    inner: Mutex<W>,
}

impl<W: LogWriter> SynchronizedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn append(&self, event: &LogEvent) -> Result<()> {
        self.inner.lock().append(event)
    }

    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    /// Run `f` with the inner writer locked
    pub fn with_inner<T>(&self, f: impl FnOnce(&W) -> T) -> T {
        f(&self.inner.lock())
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: LogWriter> LogWriter for SynchronizedWriter<W> {
    fn append(&mut self, event: &LogEvent) -> Result<()> {
        self.inner.get_mut().append(event)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.get_mut().close()
    }

    fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }
}

type DynWriter = BareWriter<Box<dyn RecordStore>, Box<dyn LogCodec>>;

/// Synchronized writer bound to one store path
pub struct SharedWriter {
    path: PathBuf,
    format: RecordFormat,
    inner: SynchronizedWriter<DynWriter>,
}

impl SharedWriter {
    pub fn new(
        path: impl Into<PathBuf>,
        format: RecordFormat,
        store: Box<dyn RecordStore>,
        codec: Box<dyn LogCodec>,
    ) -> Self {
        Self {
            path: path.into(),
            format,
            inner: SynchronizedWriter::new(BareWriter::new(store, codec)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    pub fn append(&self, event: &LogEvent) -> Result<()> {
        self.inner.append(event)
    }

    pub fn close(&self) -> Result<()> {
        let result = self.inner.close();
        tracing::debug!("Closed writer for {}", self.path.display());
        result
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Records currently in the underlying store
    pub fn record_count(&self) -> Result<u64> {
        Ok(self.inner.with_inner(|w| w.store().len())?)
    }
}

impl std::fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWriter")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("closed", &self.is_closed())
            .finish()
    }
}
