use super::level::Level;
use super::throwable::ThrowableInfo;
use std::fmt;

/// Protocol version written by the binary codec
pub const BINARY_VERSION: u32 = 1;

/// Upper bound on thread and logger name length, in bytes
pub const MAX_NAME_BYTES: usize = 4096;

/// One argument of a parameterized log call.
///
/// Values without a primitive tag are carried as [`Arg::Object`], which holds
/// only their `Display` rendering: decoding yields that text, never the
/// original value.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Level(Level),
    Object(String),
}

impl Arg {
    /// Render an arbitrary value to its text form
    pub fn object<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Arg::Object(value.to_string())
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Null => f.write_str("null"),
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Float(v) => write!(f, "{}", v),
            Arg::Text(s) | Arg::Object(s) => f.write_str(s),
            Arg::Level(level) => f.write_str(level.as_str()),
        }
    }
}

macro_rules! arg_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg {
            fn from(v: $t) -> Self {
                Arg::Int(v as i64)
            }
        })*
    };
}

arg_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Float(v as f64)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Text(v)
    }
}

impl From<Level> for Arg {
    fn from(v: Level) -> Self {
        Arg::Level(v)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        v.map_or(Arg::Null, Into::into)
    }
}

/// An immutable description of one log call.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    version: Option<u32>,
    timestamp: i64,
    level: Level,
    thread_name: String,
    logger_name: String,
    message: String,
    args: Vec<Arg>,
    throwable: Option<ThrowableInfo>,
}

impl LogEvent {
    /// Create an event stamped with the current time and calling thread
    pub fn new(level: Level, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            version: Some(BINARY_VERSION),
            timestamp: chrono::Utc::now().timestamp_millis(),
            level,
            thread_name: current_thread_name(),
            logger_name: logger_name.into(),
            message: message.into(),
            args: Vec::new(),
            throwable: None,
        }
    }

    /// Reassemble an event from decoded parts
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        version: Option<u32>,
        timestamp: i64,
        level: Level,
        thread_name: String,
        logger_name: String,
        message: String,
        args: Vec<Arg>,
        throwable: Option<ThrowableInfo>,
    ) -> Self {
        Self {
            version,
            timestamp,
            level,
            thread_name,
            logger_name,
            message,
            args,
            throwable,
        }
    }

    pub fn with_args(mut self, args: Vec<Arg>) -> Self {
        self.args = args;
        self
    }

    pub fn with_throwable(mut self, throwable: ThrowableInfo) -> Self {
        self.throwable = Some(throwable);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn throwable(&self) -> Option<&ThrowableInfo> {
        self.throwable.as_ref()
    }
}

/// Name of the calling thread, falling back to its id for unnamed threads
pub fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}
