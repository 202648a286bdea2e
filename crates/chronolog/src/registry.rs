//! Logger registry
//!
//! Resolves a logger name to a level and a writer once, then serves the
//! cached `Arc<Logger>`. Writers are shared by every logger that resolves to
//! the same store path, and each path's store is opened exactly once.

use crate::codec;
use crate::logger::Logger;
use crate::writer::SharedWriter;
use chronolog_core::{
    error::{ChronologError, Result, WriteError},
    observe, ConfigSource, Level, LoggerSettings, RecordFormat, RegistryConfig, StoreOpener,
    TomlFileSource,
};
use chronolog_file_store::FileStoreOpener;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Counts of cached registry entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub loggers: usize,
    pub writers: usize,
}

#[derive(Default)]
struct RegistryState {
    /// `None` once shut down
    config: Option<Arc<RegistryConfig>>,
    loggers: HashMap<String, Arc<Logger>>,
    writers: HashMap<PathBuf, Arc<SharedWriter>>,
}

impl RegistryState {
    fn with_config(config: RegistryConfig) -> Self {
        Self {
            config: Some(Arc::new(config)),
            ..Default::default()
        }
    }

    /// Close and forget every writer, returning the first close error
    fn close_writers(&mut self) -> Result<()> {
        self.loggers.clear();
        let mut first_err = None;
        for (path, writer) in self.writers.drain() {
            if let Err(e) = writer.close() {
                tracing::warn!("Failed to close writer for {}: {}", path.display(), e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Entry point for obtaining loggers
///
/// # Example
///
/// ```no_run
/// use chronolog::prelude::*;
///
/// # fn main() -> chronolog::Result<()> {
/// let config = RegistryConfig::new("/var/log/app", "root")
///     .with_root_level(Level::Info)
///     .with_logger("app.db", LoggerSettings::default().with_path("db"));
/// let registry = LoggerRegistry::new(config)?;
///
/// let logger = registry.resolve("app.db.pool")?;
/// logger.info("opened {} connections", vec![Arg::from(8)])?;
/// # Ok(())
/// # }
/// ```
pub struct LoggerRegistry {
    source: Box<dyn ConfigSource>,
    opener: Arc<dyn StoreOpener>,
    state: RwLock<RegistryState>,
}

impl LoggerRegistry {
    /// Create a registry over file stores with a fixed configuration
    pub fn new(config: RegistryConfig) -> Result<Self> {
        Self::with_source(config, Arc::new(FileStoreOpener))
    }

    /// Create a registry reading its configuration from a TOML file
    ///
    /// The file is read again on every [`reload`](Self::reload).
    pub fn from_toml_file(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_source(TomlFileSource::new(path), Arc::new(FileStoreOpener))
    }

    /// Create a registry with a custom configuration source and store opener
    pub fn with_source<S>(source: S, opener: Arc<dyn StoreOpener>) -> Result<Self>
    where
        S: ConfigSource + 'static,
    {
        let config = source.load()?;
        config.validate()?;
        tracing::info!(
            "Logger registry configured with {} logger overrides",
            config.loggers.len()
        );

        Ok(Self {
            source: Box::new(source),
            opener,
            state: RwLock::new(RegistryState::with_config(config)),
        })
    }

    /// Resolve `name` to its logger, creating it on first use
    pub fn resolve(&self, name: &str) -> Result<Arc<Logger>> {
        {
            let state = self.state.read();
            if state.config.is_none() {
                return Err(WriteError::Closed.into());
            }
            if let Some(logger) = state.loggers.get(name) {
                return Ok(Arc::clone(logger));
            }
        }

        let mut state = self.state.write();
        let config = match &state.config {
            Some(config) => Arc::clone(config),
            None => return Err(WriteError::Closed.into()),
        };
        // Another thread may have won the race for the write guard.
        if let Some(logger) = state.loggers.get(name) {
            return Ok(Arc::clone(logger));
        }

        let level = effective_level(&config, name);
        let path = effective_path(&config, name)?;
        let format = effective_format(&config, name);

        let writer = match state.writers.get(&path) {
            Some(writer) if writer.format() != format => {
                return Err(ChronologError::Config(format!(
                    "Logger '{}' wants {:?} records in {}, which already holds {:?} records",
                    name,
                    format,
                    path.display(),
                    writer.format()
                )));
            }
            Some(writer) => Arc::clone(writer),
            None => {
                let writer = Arc::new(self.open_writer(&config, &path, format)?);
                state.writers.insert(path, Arc::clone(&writer));
                writer
            }
        };

        let logger = Arc::new(Logger::new(name, level, writer));
        state.loggers.insert(name.to_string(), Arc::clone(&logger));
        observe::set_logger_count(state.loggers.len());
        tracing::debug!("Resolved logger '{}' at {}", name, level);

        Ok(logger)
    }

    fn open_writer(
        &self,
        config: &RegistryConfig,
        path: &Path,
        format: RecordFormat,
    ) -> Result<SharedWriter> {
        let codec = codec::for_format(format, config)?;
        let store = self.opener.open(path, &config.store)?;
        observe::record_writer_opened();
        tracing::info!("Opened {} writer for {}", codec.name(), path.display());
        Ok(SharedWriter::new(path, format, store, codec))
    }

    /// Load configuration from the source and start over with it
    ///
    /// On a load or validation failure the current state is kept. On success
    /// every writer is closed and both caches are cleared; loggers handed out
    /// before the reload fail their appends from then on. Also brings a shut
    /// down registry back.
    pub fn reload(&self) -> Result<()> {
        let config = self.source.load()?;
        config.validate()?;

        let mut state = self.state.write();
        let mut old = std::mem::replace(&mut *state, RegistryState::with_config(config));
        let result = old.close_writers();
        observe::set_logger_count(0);
        tracing::info!("Logger registry reloaded");
        result
    }

    /// Close every writer and refuse further resolution until [`reload`](Self::reload)
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.state.write();
        state.config = None;
        let result = state.close_writers();
        observe::set_logger_count(0);
        tracing::info!("Logger registry shut down");
        result
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.read().config.is_none()
    }

    /// The active configuration, or `None` after shutdown
    pub fn config(&self) -> Option<Arc<RegistryConfig>> {
        self.state.read().config.clone()
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.read();
        RegistryStats {
            loggers: state.loggers.len(),
            writers: state.writers.len(),
        }
    }
}

impl Drop for LoggerRegistry {
    fn drop(&mut self) {
        // close_writers already warns per failure
        let _ = self.state.get_mut().close_writers();
    }
}

/// `prefix` names `name` itself or one of its dotted ancestors
fn is_dotted_prefix(prefix: &str, name: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}

/// Most specific override for `name` that sets the field picked by `pick`
fn longest_match<'a, T>(
    config: &'a RegistryConfig,
    name: &str,
    pick: impl Fn(&'a LoggerSettings) -> Option<T>,
) -> Option<T> {
    config
        .loggers
        .iter()
        .filter(|(prefix, _)| is_dotted_prefix(prefix, name))
        .filter_map(|(prefix, settings)| pick(settings).map(|value| (prefix.len(), value)))
        .max_by_key(|(len, _)| *len)
        .map(|(_, value)| value)
}

fn effective_level(config: &RegistryConfig, name: &str) -> Level {
    longest_match(config, name, |s| s.level).unwrap_or_else(|| config.root_level())
}

fn effective_format(config: &RegistryConfig, name: &str) -> RecordFormat {
    longest_match(config, name, |s| s.format).unwrap_or_else(|| config.root_format())
}

fn effective_path(config: &RegistryConfig, name: &str) -> Result<PathBuf> {
    let path = longest_match(config, name, |s| s.path.as_deref())
        .or(config.root.path.as_deref())
        .ok_or_else(|| ChronologError::Config("root.path is required".into()))?;
    Ok(config.store_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronolog_core::{config::from_fn, MemoryStoreOpener};
    use parking_lot::Mutex;

    fn config() -> RegistryConfig {
        RegistryConfig::new("/logs", "root")
            .with_root_level(Level::Warn)
            .with_logger("a.b", LoggerSettings::default().with_level(Level::Debug))
            .with_logger(
                "a.b.c",
                LoggerSettings::default()
                    .with_level(Level::Trace)
                    .with_path("abc"),
            )
            .with_logger("x", LoggerSettings::default().with_path("/abs/x"))
    }

    #[test]
    fn test_dotted_prefix() {
        assert!(is_dotted_prefix("a.b", "a.b"));
        assert!(is_dotted_prefix("a.b", "a.b.c"));
        assert!(!is_dotted_prefix("a.b", "a.bc"));
        assert!(!is_dotted_prefix("a.b.c", "a.b"));
    }

    #[test]
    fn test_longest_prefix_wins_per_field() {
        let config = config();
        assert_eq!(effective_level(&config, "a.b.c.d"), Level::Trace);
        assert_eq!(effective_level(&config, "a.b.x"), Level::Debug);
        assert_eq!(effective_level(&config, "a.bc"), Level::Warn);
        assert_eq!(effective_level(&config, "other"), Level::Warn);

        // a.b sets no path, so a.b.x falls through to the root path
        assert_eq!(
            effective_path(&config, "a.b.x").unwrap(),
            PathBuf::from("/logs/root")
        );
        assert_eq!(
            effective_path(&config, "a.b.c.d").unwrap(),
            PathBuf::from("/logs/abc")
        );
        assert_eq!(effective_path(&config, "x.y").unwrap(), PathBuf::from("/abs/x"));
    }

    #[test]
    fn test_resolve_caches_and_shares_writers() {
        let opener = Arc::new(MemoryStoreOpener::new());
        let registry = LoggerRegistry::with_source(config(), opener.clone()).unwrap();

        let first = registry.resolve("a.b.x").unwrap();
        let again = registry.resolve("a.b.x").unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let other = registry.resolve("other").unwrap();
        assert!(Arc::ptr_eq(first.writer(), other.writer()));
        assert_eq!(opener.open_count(Path::new("/logs/root")), 1);

        registry.resolve("a.b.c").unwrap();
        assert_eq!(opener.total_opens(), 2);
        assert_eq!(
            registry.stats(),
            RegistryStats {
                loggers: 3,
                writers: 2
            }
        );
    }

    #[test]
    fn test_aliased_paths_share_one_writer() {
        let config = RegistryConfig::new("/logs", "root")
            .with_logger("a", LoggerSettings::default().with_path("db"))
            .with_logger("b", LoggerSettings::default().with_path("sub/../db"))
            .with_logger("c", LoggerSettings::default().with_path("./db/."))
            .with_logger("d", LoggerSettings::default().with_path("/logs/db"));
        let opener = Arc::new(MemoryStoreOpener::new());
        let registry = LoggerRegistry::with_source(config, opener.clone()).unwrap();

        let a = registry.resolve("a").unwrap();
        for name in ["b", "c", "d"] {
            let other = registry.resolve(name).unwrap();
            assert!(Arc::ptr_eq(a.writer(), other.writer()), "{}", name);
        }
        assert_eq!(opener.total_opens(), 1);
        assert_eq!(opener.open_count(Path::new("/logs/db")), 1);
        assert_eq!(registry.stats().writers, 1);
    }

    #[test]
    fn test_format_conflict_on_shared_path() {
        let config = RegistryConfig::new("/logs", "shared").with_logger(
            "text",
            LoggerSettings::default().with_format(RecordFormat::Text),
        );
        let opener = Arc::new(MemoryStoreOpener::new());
        let registry = LoggerRegistry::with_source(config, opener.clone()).unwrap();

        registry.resolve("bin").unwrap();
        assert!(matches!(
            registry.resolve("text"),
            Err(ChronologError::Config(_))
        ));
        assert_eq!(opener.total_opens(), 1);
        assert_eq!(registry.stats().loggers, 1);
    }

    #[test]
    fn test_shutdown_then_reload() {
        let opener = Arc::new(MemoryStoreOpener::new());
        let registry = LoggerRegistry::with_source(config(), opener.clone()).unwrap();
        let logger = registry.resolve("a.b").unwrap();

        registry.shutdown().unwrap();
        assert!(registry.is_shut_down());
        assert!(registry.resolve("a.b").unwrap_err().is_closed());
        assert!(logger.error("late", vec![]).unwrap_err().is_closed());

        registry.reload().unwrap();
        assert!(!registry.is_shut_down());
        let fresh = registry.resolve("a.b").unwrap();
        assert!(!Arc::ptr_eq(&logger, &fresh));
        fresh.error("back", vec![]).unwrap();
        // The old logger's writer stays closed.
        assert!(logger.error("still late", vec![]).is_err());
        assert_eq!(opener.open_count(Path::new("/logs/root")), 2);
    }

    #[test]
    fn test_failed_reload_keeps_state() {
        let current = Arc::new(Mutex::new(config()));
        let source = {
            let current = Arc::clone(&current);
            from_fn(move || Ok(current.lock().clone()))
        };
        let registry =
            LoggerRegistry::with_source(source, Arc::new(MemoryStoreOpener::new())).unwrap();
        let logger = registry.resolve("a.b").unwrap();

        current.lock().root.path = None;
        assert!(matches!(registry.reload(), Err(ChronologError::Config(_))));
        assert!(Arc::ptr_eq(&logger, &registry.resolve("a.b").unwrap()));
        logger.warn("still writing", vec![]).unwrap();

        *current.lock() = config().with_root_level(Level::Error);
        registry.reload().unwrap();
        assert_eq!(registry.resolve("other").unwrap().level(), Level::Error);
        // The successful reload closed the writers the old loggers hold.
        assert!(logger.warn("after reload", vec![]).unwrap_err().is_closed());
        assert!(!Arc::ptr_eq(&logger, &registry.resolve("a.b").unwrap()));
    }

    #[test]
    fn test_invalid_initial_config() {
        let config = RegistryConfig::new("/logs", "root").with_date_format("");
        assert!(LoggerRegistry::with_source(config, Arc::new(MemoryStoreOpener::new())).is_err());
    }
}
