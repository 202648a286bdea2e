//! Chronolog: structured logging into append-only record stores
//!
//! Every log event is persisted as one randomly readable record instead of a
//! line in a text file:
//! - **Codecs**: a lossless binary format and a human-readable text format
//! - **Writers**: one writer per store, serializing concurrent producers
//! - **Registry**: resolves logger names to levels and writers once, by
//!   longest dotted-prefix match, and caches the result
//! - **Tailer**: reads records back in order and decodes them
//!
//! # Quick Start
//!
//! ```no_run
//! use chronolog::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = RegistryConfig::new("./logs", "app").with_root_level(Level::Info);
//! let registry = LoggerRegistry::new(config)?;
//!
//! let logger = registry.resolve("app.http")?;
//! logger.info("listening on {}", vec![Arg::from(8080)])?;
//!
//! // Read the records back
//! let store = StoreConfig::default();
//! let reader = FileRecordReader::open("./logs/app", &store)?;
//! for event in LogTailer::new(reader, BinaryCodec::new()) {
//!     println!("{}", event?.message());
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod logger;
pub mod prelude;
pub mod registry;
pub mod tailer;
pub mod writer;

// Re-export core types
pub use chronolog_core::{
    config::{
        from_fn, ConfigSource, LoggerSettings, RecordFormat, RegistryConfig, RollCycle,
        StorageKind, StoreConfig, TomlFileSource,
    },
    error::{ChronologError, CodecError, DecodeError, Result, StoreError, WriteError},
    traits::{LogCodec, RecordRead, RecordStore, StoreOpener, StoreStats},
    types::{Arg, Level, LogEvent, StackFrame, ThrowableInfo, BINARY_VERSION, MAX_NAME_BYTES},
    MemoryStore, MemoryStoreOpener,
};

// Re-export implementations
pub use chronolog_file_store::{FileRecordReader, FileRecordStore, FileStoreOpener};

// Re-export main types from this crate
pub use codec::{format_message, BinaryCodec, TextCodec};
pub use logger::Logger;
pub use registry::{LoggerRegistry, RegistryStats};
pub use tailer::LogTailer;
pub use writer::{BareWriter, LogWriter, SharedWriter, SynchronizedWriter};
