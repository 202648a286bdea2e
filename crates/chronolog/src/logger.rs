use crate::writer::SharedWriter;
use chronolog_core::{observe, Arg, Level, LogEvent, Result, ThrowableInfo};
use std::sync::Arc;

/// A named logger with a resolved level and a shared writer
///
/// Obtained from [`LoggerRegistry::resolve`](crate::LoggerRegistry::resolve);
/// repeated resolution of the same name returns the same `Arc<Logger>`.
#[derive(Debug)]
pub struct Logger {
    name: String,
    level: Level,
    writer: Arc<SharedWriter>,
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>, level: Level, writer: Arc<SharedWriter>) -> Self {
        Self {
            name: name.into(),
            level,
            writer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The level this logger admits events at or above
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn writer(&self) -> &Arc<SharedWriter> {
        &self.writer
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.level.admits(level)
    }

    /// Write one event if `level` passes the filter
    ///
    /// Filtered calls return `Ok(())` without building an event.
    pub fn log(
        &self,
        level: Level,
        template: &str,
        args: Vec<Arg>,
        throwable: Option<ThrowableInfo>,
    ) -> Result<()> {
        if !self.is_enabled(level) {
            observe::record_filtered();
            return Ok(());
        }

        let mut event = LogEvent::new(level, self.name.as_str(), template).with_args(args);
        if let Some(throwable) = throwable {
            event = event.with_throwable(throwable);
        }
        self.writer.append(&event)
    }

    pub fn trace(&self, template: &str, args: Vec<Arg>) -> Result<()> {
        self.log(Level::Trace, template, args, None)
    }

    pub fn debug(&self, template: &str, args: Vec<Arg>) -> Result<()> {
        self.log(Level::Debug, template, args, None)
    }

    pub fn info(&self, template: &str, args: Vec<Arg>) -> Result<()> {
        self.log(Level::Info, template, args, None)
    }

    pub fn warn(&self, template: &str, args: Vec<Arg>) -> Result<()> {
        self.log(Level::Warn, template, args, None)
    }

    pub fn error(&self, template: &str, args: Vec<Arg>) -> Result<()> {
        self.log(Level::Error, template, args, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BinaryCodec;
    use chronolog_core::{LogCodec, MemoryStore, RecordFormat};

    fn logger(level: Level) -> (Logger, MemoryStore) {
        let store = MemoryStore::default();
        let writer = SharedWriter::new(
            "mem",
            RecordFormat::Binary,
            Box::new(store.handle()),
            Box::new(BinaryCodec::new()),
        );
        (Logger::new("app.db", level, Arc::new(writer)), store)
    }

    #[test]
    fn test_is_enabled_follows_level_order() {
        let (logger, _) = logger(Level::Info);
        for level in Level::ALL {
            assert_eq!(logger.is_enabled(level), level >= Level::Info, "{}", level);
        }
    }

    #[test]
    fn test_filtered_calls_write_nothing() {
        let (logger, store) = logger(Level::Warn);
        logger.debug("dropped {}", vec![1.into()]).unwrap();
        logger.info("dropped", vec![]).unwrap();
        logger.warn("kept {}", vec!["w".into()]).unwrap();
        logger.error("kept", vec![]).unwrap();

        let codec = BinaryCodec::new();
        let levels: Vec<Level> = store
            .records()
            .iter()
            .map(|r| codec.decode(r).unwrap().level())
            .collect();
        assert_eq!(levels, vec![Level::Warn, Level::Error]);
    }

    #[test]
    fn test_log_attaches_throwable_and_name() {
        let (logger, store) = logger(Level::Trace);
        let throwable = ThrowableInfo::new("std::io::Error").with_message("denied");
        logger
            .log(Level::Error, "open failed", vec![], Some(throwable.clone()))
            .unwrap();

        let event = BinaryCodec::new().decode(&store.records()[0]).unwrap();
        assert_eq!(event.logger_name(), "app.db");
        assert_eq!(event.throwable(), Some(&throwable));
    }
}
