use crate::error::Result;
use crate::types::LogEvent;

/// Encode/decode pair for one record wire format
pub trait LogCodec: Send + Sync {
    /// Encode an event into one record
    fn encode(&self, event: &LogEvent) -> Result<Vec<u8>>;

    /// Decode one record
    fn decode(&self, bytes: &[u8]) -> Result<LogEvent>;

    /// Codec name, for diagnostics
    fn name(&self) -> &str;
}

impl<C: LogCodec + ?Sized> LogCodec for Box<C> {
    fn encode(&self, event: &LogEvent) -> Result<Vec<u8>> {
        (**self).encode(event)
    }

    fn decode(&self, bytes: &[u8]) -> Result<LogEvent> {
        (**self).decode(bytes)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<C: LogCodec + ?Sized> LogCodec for std::sync::Arc<C> {
    fn encode(&self, event: &LogEvent) -> Result<Vec<u8>> {
        (**self).encode(event)
    }

    fn decode(&self, bytes: &[u8]) -> Result<LogEvent> {
        (**self).decode(bytes)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
