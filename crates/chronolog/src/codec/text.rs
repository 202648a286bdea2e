//! Human-readable record format
//!
//! One primary line per event:
//!
//! ```text
//! 2026.10.17-13:42:07.125 [main] INFO com.acme.Service - user alice logged in
//! ```
//!
//! followed, when the event carries a throwable, by indented lines:
//!
//! ```text
//!   java.io.IOException: disk full
//!     at com.acme.Store.flush(Store.java:88)
//!     ... 12 more
//!   Caused by: java.lang.RuntimeException
//! ```
//!
//! The format is lossy: arguments are substituted into the message, and the
//! throwable comes back as text appended to the message.

use super::format::format_message;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chronolog_core::{
    error::{ChronologError, CodecError, Result},
    Level, LogCodec, LogEvent, ThrowableInfo, MAX_CAUSE_DEPTH, MAX_NAME_BYTES,
};
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct TextCodec {
    date_format: String,
    stack_trace_depth: Option<usize>,
}

impl TextCodec {
    /// Create a codec rendering timestamps with the strftime pattern
    /// `date_format`, in UTC.
    ///
    /// The pattern must parse back: it needs a full date, a time of day,
    /// or both. A time-only pattern decodes onto 1970-01-01.
    pub fn new(date_format: impl Into<String>) -> Result<Self> {
        let date_format = date_format.into();
        if date_format.is_empty()
            || StrftimeItems::new(&date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ChronologError::Config(format!(
                "Invalid date format '{}'",
                date_format
            )));
        }
        let codec = Self {
            date_format,
            stack_trace_depth: None,
        };

        // 2001-02-03T04:05:06.789Z
        let sample = codec.format_timestamp(981_173_106_789)?;
        if codec.parse_timestamp(&sample).is_err() {
            return Err(ChronologError::Config(format!(
                "Date format '{}' renders timestamps that cannot be parsed back",
                codec.date_format
            )));
        }
        Ok(codec)
    }

    pub fn with_stack_trace_depth(mut self, depth: usize) -> Self {
        self.stack_trace_depth = Some(depth);
        self
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    fn format_timestamp(&self, millis: i64) -> Result<String> {
        let at: DateTime<Utc> = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            CodecError::InvalidTimestamp(format!("{} ms is out of range", millis))
        })?;
        Ok(at.format(&self.date_format).to_string())
    }

    fn parse_timestamp(&self, s: &str) -> Result<i64> {
        if let Ok(at) = NaiveDateTime::parse_from_str(s, &self.date_format) {
            return Ok(at.and_utc().timestamp_millis());
        }
        // Date-only patterns start at midnight, time-only ones at the epoch.
        if let Some(at) = NaiveDate::parse_from_str(s, &self.date_format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(at.and_utc().timestamp_millis());
        }
        NaiveTime::parse_from_str(s, &self.date_format)
            .map(|time| NaiveDateTime::new(NaiveDate::default(), time))
            .map(|at| at.and_utc().timestamp_millis())
            .map_err(|_| CodecError::InvalidTimestamp(s.to_string()).into())
    }

    fn render_throwable(&self, out: &mut String, throwable: &ThrowableInfo) -> Result<()> {
        if throwable.chain_len() > MAX_CAUSE_DEPTH {
            return Err(CodecError::CauseChainTooDeep(MAX_CAUSE_DEPTH).into());
        }

        let mut prefix = "";
        let mut current = Some(throwable);
        while let Some(t) = current {
            out.push_str("\n  ");
            out.push_str(prefix);
            out.push_str(&t.class_name);
            if let Some(message) = &t.message {
                let _ = write!(out, ": {}", message);
            }

            let kept = self
                .stack_trace_depth
                .map_or(t.frames.len(), |depth| depth.min(t.frames.len()));
            for frame in &t.frames[..kept] {
                let _ = write!(out, "\n    at {}", frame);
            }
            if kept < t.frames.len() {
                let _ = write!(out, "\n    ... {} more", t.frames.len() - kept);
            }

            prefix = "Caused by: ";
            current = t.cause.as_deref();
        }
        Ok(())
    }
}

impl Default for TextCodec {
    fn default() -> Self {
        Self {
            date_format: "%Y.%m.%d-%H:%M:%S%.3f".to_string(),
            stack_trace_depth: None,
        }
    }
}

fn check_name(field: &'static str, name: &str) -> Result<()> {
    if name.len() > MAX_NAME_BYTES {
        return Err(CodecError::NameTooLong {
            field,
            len: name.len(),
            max: MAX_NAME_BYTES,
        }
        .into());
    }
    Ok(())
}

fn malformed(line: &str) -> ChronologError {
    CodecError::MalformedLine(line.to_string()).into()
}

struct Header<'a> {
    timestamp: &'a str,
    thread_name: &'a str,
    level: Level,
    logger_name: &'a str,
    message: &'a str,
}

/// Split `<ts> [<thread>] <LEVEL> <logger> - <message>`.
///
/// Thread names may contain `"] "`, so every such position is tried in
/// order and the first one followed by a known level and a `" - "`
/// separator wins.
fn split_header(line: &str) -> Result<Header<'_>> {
    let (timestamp, after) = line.split_once(" [").ok_or_else(|| malformed(line))?;

    let mut unknown_level = None;
    for (pos, _) in after.match_indices("] ") {
        let thread_name = &after[..pos];
        let Some((level, rest)) = after[pos + 2..].split_once(' ') else {
            continue;
        };
        let Some((logger_name, message)) = rest.split_once(" - ") else {
            continue;
        };
        match level.parse::<Level>() {
            Ok(level) => {
                return Ok(Header {
                    timestamp,
                    thread_name,
                    level,
                    logger_name,
                    message,
                })
            }
            Err(e) => {
                unknown_level.get_or_insert(ChronologError::from(e));
            }
        }
    }
    Err(unknown_level.unwrap_or_else(|| malformed(line)))
}

impl LogCodec for TextCodec {
    fn encode(&self, event: &LogEvent) -> Result<Vec<u8>> {
        check_name("thread name", event.thread_name())?;
        check_name("logger name", event.logger_name())?;

        let mut out = String::with_capacity(64 + event.message().len());
        let _ = write!(
            out,
            "{} [{}] {} {} - {}",
            self.format_timestamp(event.timestamp())?,
            event.thread_name(),
            event.level(),
            event.logger_name(),
            format_message(event.message(), event.args()),
        );
        if let Some(throwable) = event.throwable() {
            self.render_throwable(&mut out, throwable)?;
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<LogEvent> {
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8("record"))?;
        let (first, rest) = match text.split_once('\n') {
            Some((first, rest)) => (first, Some(rest)),
            None => (text, None),
        };

        let header = split_header(first)?;
        let timestamp = self.parse_timestamp(header.timestamp)?;

        let mut message = header.message.to_string();
        if let Some(rest) = rest {
            message.push('\n');
            message.push_str(rest);
        }

        Ok(LogEvent::from_parts(
            None,
            timestamp,
            header.level,
            header.thread_name.to_string(),
            header.logger_name.to_string(),
            message,
            Vec::new(),
            None,
        ))
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronolog_core::{Arg, DecodeError, StackFrame};

    // 2026-10-17T13:42:07.125Z
    const TS: i64 = 1_792_244_527_125;

    fn event(level: Level, message: &str) -> LogEvent {
        LogEvent::new(level, "com.acme.Service", message)
            .with_timestamp(TS)
            .with_thread_name("main")
    }

    fn encode_str(codec: &TextCodec, event: &LogEvent) -> String {
        String::from_utf8(codec.encode(event).unwrap()).unwrap()
    }

    #[test]
    fn test_line_layout() {
        let codec = TextCodec::default();
        let e = event(Level::Info, "user {} logged in").with_args(vec![Arg::from("alice")]);
        assert_eq!(
            encode_str(&codec, &e),
            "2026.10.17-13:42:07.125 [main] INFO com.acme.Service - user alice logged in"
        );
    }

    #[test]
    fn test_level_argument_is_substituted_and_lost() {
        let codec = TextCodec::default();
        let e = LogEvent::new(Level::Debug, "logger_1", "level is {}")
            .with_args(vec![Arg::Level(Level::Debug)]);

        let decoded = codec.decode(&codec.encode(&e).unwrap()).unwrap();
        assert_eq!(decoded.message(), "level is DEBUG");
        assert!(decoded.args().is_empty());
        assert_eq!(decoded.level(), Level::Debug);
        assert_eq!(decoded.logger_name(), "logger_1");
        assert_eq!(decoded.version(), None);
        assert!(decoded.throwable().is_none());
    }

    #[test]
    fn test_timestamp_round_trips_at_format_precision() {
        let codec = TextCodec::default();
        let decoded = codec.decode(&codec.encode(&event(Level::Warn, "x")).unwrap()).unwrap();
        assert_eq!(decoded.timestamp(), TS);
        assert_eq!(decoded.thread_name(), "main");

        let coarse = TextCodec::new("%Y-%m-%d").unwrap();
        let decoded = coarse.decode(&coarse.encode(&event(Level::Warn, "x")).unwrap()).unwrap();
        assert_eq!(decoded.timestamp(), TS - TS.rem_euclid(86_400_000));
    }

    #[test]
    fn test_time_only_format_decodes_onto_epoch_day() {
        let codec = TextCodec::new("%H:%M:%S").unwrap();
        let text = encode_str(&codec, &event(Level::Info, "tick"));
        assert!(text.starts_with("13:42:07 [main] INFO"), "{}", text);

        let decoded = codec.decode(text.as_bytes()).unwrap();
        assert_eq!(decoded.timestamp(), (13 * 3600 + 42 * 60 + 7) * 1000);
        assert_eq!(decoded.message(), "tick");

        let millis = TextCodec::new("%H:%M:%S%.3f").unwrap();
        let decoded = millis.decode(&millis.encode(&event(Level::Info, "tick")).unwrap()).unwrap();
        assert_eq!(decoded.timestamp(), TS.rem_euclid(86_400_000));
    }

    #[test]
    fn test_thread_names_with_brackets() {
        let codec = TextCodec::default();
        for thread in ["pool [1] worker", "] ", "worker]", "a] b] c"] {
            let e = event(Level::Warn, "done - ok").with_thread_name(thread);
            let decoded = codec.decode(&codec.encode(&e).unwrap()).unwrap();
            assert_eq!(decoded.thread_name(), thread);
            assert_eq!(decoded.level(), Level::Warn);
            assert_eq!(decoded.logger_name(), "com.acme.Service");
            assert_eq!(decoded.message(), "done - ok");
        }
    }

    #[test]
    fn test_throwable_rendering_and_lossy_decode() {
        let codec = TextCodec::default().with_stack_trace_depth(1);
        let throwable = ThrowableInfo::new("java.io.IOException")
            .with_message("disk full")
            .with_frames(vec![
                StackFrame::new("com.acme.Store", "flush").at("Store.java", 88),
                StackFrame::new("com.acme.Store", "close"),
            ])
            .with_cause(ThrowableInfo::new("java.lang.RuntimeException"));
        let e = event(Level::Error, "write failed").with_throwable(throwable);

        let expected_tail = "\n  java.io.IOException: disk full\
                             \n    at com.acme.Store.flush(Store.java:88)\
                             \n    ... 1 more\
                             \n  Caused by: java.lang.RuntimeException";
        let text = encode_str(&codec, &e);
        assert!(text.ends_with(expected_tail), "{}", text);

        let decoded = codec.decode(text.as_bytes()).unwrap();
        assert_eq!(decoded.message(), format!("write failed{}", expected_tail));
        assert!(decoded.throwable().is_none());
    }

    #[test]
    fn test_malformed_lines() {
        let codec = TextCodec::default();
        for line in [
            "",
            "no brackets here",
            "2026.10.17-13:42:07.125 [main]",
            "2026.10.17-13:42:07.125 [main] INFO logger without separator",
        ] {
            assert!(
                matches!(
                    codec.decode(line.as_bytes()),
                    Err(ChronologError::Codec(CodecError::MalformedLine(_)))
                ),
                "{:?}",
                line
            );
        }
    }

    #[test]
    fn test_unknown_level_and_bad_timestamp() {
        let codec = TextCodec::default();
        let err = codec
            .decode(b"2026.10.17-13:42:07.125 [main] FATAL l - m")
            .unwrap_err();
        assert!(matches!(
            err,
            ChronologError::Decode(DecodeError::UnknownLevelName(_))
        ));

        let err = codec.decode(b"yesterday [main] INFO l - m").unwrap_err();
        assert!(matches!(
            err,
            ChronologError::Codec(CodecError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_invalid_date_format() {
        assert!(matches!(
            TextCodec::new("%Q"),
            Err(ChronologError::Config(_))
        ));
        assert!(TextCodec::new("").is_err());

        // Neither a full date nor a time of day.
        for pattern in ["%Y", "%m/%d", "%M:%S"] {
            assert!(
                matches!(TextCodec::new(pattern), Err(ChronologError::Config(_))),
                "{}",
                pattern
            );
        }
    }
}
