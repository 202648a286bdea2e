//! Chronolog Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use chronolog::prelude::*;
//! ```

// Core types
pub use crate::{Arg, ChronologError, Level, LogEvent, Result, StackFrame, ThrowableInfo};

// Configs
pub use crate::{LoggerSettings, RecordFormat, RegistryConfig, RollCycle, StoreConfig};

// Traits
pub use crate::{ConfigSource, LogCodec, LogWriter, RecordRead, RecordStore, StoreOpener};

// Registry and loggers
pub use crate::{Logger, LoggerRegistry};

// Codecs and writers
pub use crate::{BinaryCodec, SharedWriter, SynchronizedWriter, TextCodec};

// Stores
pub use crate::{FileRecordReader, FileStoreOpener, LogTailer, MemoryStore};

// Re-export common external deps
pub use anyhow;
pub use std::sync::Arc;
pub use tracing;
