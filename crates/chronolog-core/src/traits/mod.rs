pub mod codec;
pub mod store;

pub use codec::LogCodec;
pub use store::{RecordRead, RecordStore, StoreOpener, StoreStats};
