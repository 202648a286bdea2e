use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChronologError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ChronologError {
    /// True when the error is a write against a closed writer or registry.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            ChronologError::Write(WriteError::Closed)
                | ChronologError::Write(WriteError::Store(StoreError::Closed))
                | ChronologError::Store(StoreError::Closed)
        )
    }
}

/// Malformed bytes on decode, or input the encoder cannot represent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Record truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Unsupported record version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("{field} is {len} bytes, limit is {max}")]
    NameTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{count} arguments exceed the limit of {max}")]
    TooManyArguments { count: usize, max: usize },

    #[error("Cause chain deeper than {0}")]
    CauseChainTooDeep(usize),

    #[error("Invalid flag byte {0}")]
    InvalidFlag(u8),

    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),

    #[error("Malformed text record: {0}")]
    MalformedLine(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Protocol drift: a code the decoder does not know.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unknown level code {0}")]
    UnknownLevel(u32),

    #[error("Unknown argument tag {0}")]
    UnknownArgumentTag(u8),

    #[error("Unknown level name '{0}'")]
    UnknownLevelName(String),
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Writer is closed")]
    Closed,

    #[error("Store rejected append: {0}")]
    Store(#[from] StoreError),
}

/// Failures reported by a record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Store is closed")]
    Closed,

    #[error("Record size {size} exceeds max_record_size {max}")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Store is corrupt: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, ChronologError>;
