//! Binary record format
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! [version u32][timestamp i64][level u32]
//! [thread str][logger str][message str]
//! [arg count u32] ([tag u8][value])*
//! [has throwable u8] (throwable)?
//!
//! throwable := [class str][has message u8][message str]?
//!              [frame count u32] ([class str][method str][has file u8][file str]?[line i32])*
//!              [has cause u8] (throwable)?
//! ```
//!
//! Strings are a `u32` byte length followed by UTF-8. A missing line number
//! is written as `-1`.

use super::wire::{WireReader, WireWriter};
use chronolog_core::{
    error::{CodecError, DecodeError, Result},
    Arg, Level, LogCodec, LogEvent, StackFrame, ThrowableInfo, BINARY_VERSION, MAX_CAUSE_DEPTH,
    MAX_NAME_BYTES,
};

const TAG_NULL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_TEXT: u8 = 3;
const TAG_LEVEL: u8 = 4;
const TAG_OBJECT: u8 = 5;

/// Smallest encoded argument: a bare tag
const MIN_ARG_BYTES: usize = 1;
/// Smallest encoded frame: two empty strings, a flag and a line
const MIN_FRAME_BYTES: usize = 4 + 4 + 1 + 4;

#[derive(Debug, Clone, Default)]
pub struct BinaryCodec {
    stack_trace_depth: Option<usize>,
    max_arg_count: Option<usize>,
}

impl BinaryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `depth` frames per throwable in the chain
    pub fn with_stack_trace_depth(mut self, depth: usize) -> Self {
        self.stack_trace_depth = Some(depth);
        self
    }

    /// Reject events carrying more than `max` arguments
    pub fn with_max_arg_count(mut self, max: usize) -> Self {
        self.max_arg_count = Some(max);
        self
    }

    pub fn stack_trace_depth(&self) -> Option<usize> {
        self.stack_trace_depth
    }

    pub fn max_arg_count(&self) -> Option<usize> {
        self.max_arg_count
    }

    fn put_name(w: &mut WireWriter, field: &'static str, name: &str) -> Result<()> {
        if name.len() > MAX_NAME_BYTES {
            return Err(CodecError::NameTooLong {
                field,
                len: name.len(),
                max: MAX_NAME_BYTES,
            }
            .into());
        }
        w.put_str(field, name)
    }

    fn put_arg(w: &mut WireWriter, arg: &Arg) -> Result<()> {
        match arg {
            Arg::Null => w.put_u8(TAG_NULL),
            Arg::Int(v) => {
                w.put_u8(TAG_INT);
                w.put_i64(*v);
            }
            Arg::Float(v) => {
                w.put_u8(TAG_FLOAT);
                w.put_f64(*v);
            }
            Arg::Text(s) => {
                w.put_u8(TAG_TEXT);
                w.put_str("argument", s)?;
            }
            Arg::Level(level) => {
                w.put_u8(TAG_LEVEL);
                w.put_u32(level.code());
            }
            Arg::Object(s) => {
                w.put_u8(TAG_OBJECT);
                w.put_str("argument", s)?;
            }
        }
        Ok(())
    }

    fn get_arg(r: &mut WireReader<'_>) -> Result<Arg> {
        let arg = match r.get_u8()? {
            TAG_NULL => Arg::Null,
            TAG_INT => Arg::Int(r.get_i64()?),
            TAG_FLOAT => Arg::Float(r.get_f64()?),
            TAG_TEXT => Arg::Text(r.get_str("argument")?),
            TAG_LEVEL => Arg::Level(Level::from_code(r.get_u32()?)?),
            TAG_OBJECT => Arg::Object(r.get_str("argument")?),
            tag => return Err(DecodeError::UnknownArgumentTag(tag).into()),
        };
        Ok(arg)
    }

    fn put_throwable(&self, w: &mut WireWriter, throwable: &ThrowableInfo) -> Result<()> {
        if throwable.chain_len() > MAX_CAUSE_DEPTH {
            return Err(CodecError::CauseChainTooDeep(MAX_CAUSE_DEPTH).into());
        }

        let mut current = Some(throwable);
        while let Some(t) = current {
            w.put_str("throwable class", &t.class_name)?;
            w.put_opt_str("throwable message", t.message.as_deref())?;

            let kept = self.stack_trace_depth.map_or(t.frames.len(), |depth| {
                depth.min(t.frames.len())
            });
            w.put_u32(kept as u32);
            for frame in &t.frames[..kept] {
                w.put_str("frame class", &frame.class_name)?;
                w.put_str("frame method", &frame.method_name)?;
                w.put_opt_str("frame file", frame.file_name.as_deref())?;
                let line = frame
                    .line
                    .and_then(|line| i32::try_from(line).ok())
                    .unwrap_or(-1);
                w.put_i32(line);
            }

            current = t.cause.as_deref();
            w.put_bool(current.is_some());
        }
        Ok(())
    }

    fn get_throwable(r: &mut WireReader<'_>, depth: usize) -> Result<ThrowableInfo> {
        if depth > MAX_CAUSE_DEPTH {
            return Err(CodecError::CauseChainTooDeep(MAX_CAUSE_DEPTH).into());
        }

        let class_name = r.get_str("throwable class")?;
        let message = r.get_opt_str("throwable message")?;
        let count = r.get_count(MIN_FRAME_BYTES)?;
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            let class_name = r.get_str("frame class")?;
            let method_name = r.get_str("frame method")?;
            let file_name = r.get_opt_str("frame file")?;
            let line = r.get_i32()?;
            frames.push(StackFrame {
                class_name,
                method_name,
                file_name,
                line: u32::try_from(line).ok(),
            });
        }

        let cause = if r.get_bool()? {
            Some(Box::new(Self::get_throwable(r, depth + 1)?))
        } else {
            None
        };

        Ok(ThrowableInfo {
            class_name,
            message,
            frames,
            cause,
        })
    }
}

impl LogCodec for BinaryCodec {
    fn encode(&self, event: &LogEvent) -> Result<Vec<u8>> {
        let args = event.args();
        if let Some(max) = self.max_arg_count {
            if args.len() > max {
                return Err(CodecError::TooManyArguments {
                    count: args.len(),
                    max,
                }
                .into());
            }
        }

        let mut w = WireWriter::with_capacity(64 + event.message().len());
        w.put_u32(BINARY_VERSION);
        w.put_i64(event.timestamp());
        w.put_u32(event.level().code());
        Self::put_name(&mut w, "thread name", event.thread_name())?;
        Self::put_name(&mut w, "logger name", event.logger_name())?;
        w.put_str("message", event.message())?;

        w.put_u32(args.len() as u32);
        for arg in args {
            Self::put_arg(&mut w, arg)?;
        }

        match event.throwable() {
            Some(throwable) => {
                w.put_bool(true);
                self.put_throwable(&mut w, throwable)?;
            }
            None => w.put_bool(false),
        }

        Ok(w.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<LogEvent> {
        let mut r = WireReader::new(bytes);

        let version = r.get_u32()?;
        if version != BINARY_VERSION {
            return Err(CodecError::UnsupportedVersion(version).into());
        }
        let timestamp = r.get_i64()?;
        let level = Level::from_code(r.get_u32()?)?;
        let thread_name = r.get_bounded_str("thread name", MAX_NAME_BYTES)?;
        let logger_name = r.get_bounded_str("logger name", MAX_NAME_BYTES)?;
        let message = r.get_str("message")?;

        let count = r.get_count(MIN_ARG_BYTES)?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            args.push(Self::get_arg(&mut r)?);
        }

        let throwable = if r.get_bool()? {
            Some(Self::get_throwable(&mut r, 1)?)
        } else {
            None
        };
        r.finish()?;

        Ok(LogEvent::from_parts(
            Some(version),
            timestamp,
            level,
            thread_name,
            logger_name,
            message,
            args,
            throwable,
        ))
    }

    fn name(&self) -> &str {
        "binary"
    }
}
