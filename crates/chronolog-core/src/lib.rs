//! Chronolog Core: types and traits for structured logging into record stores
//!
//! This crate defines the pieces shared by the codecs, writers and stores:
//! - `Level`, `LogEvent`, `Arg` and `ThrowableInfo`: the log event model
//! - `LogCodec`: encode/decode pair for one record format
//! - `RecordStore` / `StoreOpener`: the append-only record store interface
//! - `RegistryConfig`: logger levels, store paths and store options
//! - `MemoryStore`: an in-memory store for tests and inspection

pub mod config;
pub mod error;
pub mod memory;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{
    ConfigSource, LoggerSettings, RecordFormat, RegistryConfig, RollCycle, StorageKind,
    StoreConfig, TomlFileSource,
};
pub use error::{ChronologError, CodecError, DecodeError, Result, StoreError, WriteError};
pub use memory::{MemoryStore, MemoryStoreOpener};
pub use traits::{LogCodec, RecordRead, RecordStore, StoreOpener, StoreStats};
pub use types::{
    Arg, Level, LogEvent, StackFrame, ThrowableInfo, BINARY_VERSION, MAX_CAUSE_DEPTH,
    MAX_NAME_BYTES,
};
