pub mod registry;
pub mod store;

pub use registry::{
    from_fn, ConfigSource, FromFn, LoggerSettings, RecordFormat, RegistryConfig, TomlFileSource,
    DEFAULT_LEVEL,
};
pub use store::{RollCycle, StorageKind, StoreConfig};
