//! File-based record store implementation
//!
//! Provides the append-only record store that chronolog writers persist log
//! events into, using plain sequential file writes.
//!
//! Features:
//! - Indexed layout: one data file plus an offset index
//! - Rolling layout: one data/index pair per daily, hourly or minutely cycle
//! - Random access by record index, across cycles
//! - All-or-nothing appends; torn tails are dropped on reopen
//! - Multiple concurrent readers, single writer

mod reader;
mod segment;
mod store;

pub use reader::FileRecordReader;
pub use store::{FileRecordStore, FileStoreOpener};
