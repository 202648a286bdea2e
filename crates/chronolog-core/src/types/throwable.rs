use std::any;
use std::error::Error;
use std::fmt;

use crate::error::{ChronologError, CodecError, StoreError};

/// Deepest cause chain the codecs will walk
pub const MAX_CAUSE_DEPTH: usize = 64;

/// One frame of a captured stack trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub class_name: String,
    pub method_name: String,
    pub file_name: Option<String>,
    pub line: Option<u32>,
}

impl StackFrame {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            file_name: None,
            line: None,
        }
    }

    pub fn at(mut self, file_name: impl Into<String>, line: u32) -> Self {
        self.file_name = Some(file_name.into());
        self.line = Some(line);
        self
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.class_name, self.method_name)?;
        match (&self.file_name, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}", file, line)?,
            (Some(file), None) => f.write_str(file)?,
            (None, _) => f.write_str("Unknown Source")?,
        }
        f.write_str(")")
    }
}

/// Structured exception data attached to an event.
///
/// Causes form a singly-linked chain through [`ThrowableInfo::cause`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowableInfo {
    pub class_name: String,
    pub message: Option<String>,
    pub frames: Vec<StackFrame>,
    pub cause: Option<Box<ThrowableInfo>>,
}

impl ThrowableInfo {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: None,
            frames: Vec::new(),
            cause: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_cause(mut self, cause: ThrowableInfo) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Build from a Rust error, following its `source()` chain.
    ///
    /// The outermost class name is the full type name of `E`. Causes are
    /// only known as trait objects, so they are named after the concrete
    /// type when it is one of the common error types and
    /// `dyn std::error::Error` otherwise.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        Self::from_chain(any::type_name::<E>(), err)
    }

    /// Build from an error trait object, e.g. one unboxed from `Box<dyn Error>`
    pub fn from_dyn_error(err: &(dyn Error + 'static)) -> Self {
        Self::from_chain(dyn_type_name(err), err)
    }

    fn from_chain(head_name: &str, err: &(dyn Error + 'static)) -> Self {
        let mut chain = vec![ThrowableInfo::new(head_name).with_message(err.to_string())];
        let mut current = err.source();
        while let Some(e) = current {
            if chain.len() == MAX_CAUSE_DEPTH {
                break;
            }
            chain.push(ThrowableInfo::new(dyn_type_name(e)).with_message(e.to_string()));
            current = e.source();
        }

        let mut iter = chain.into_iter().rev();
        let mut root = iter
            .next()
            .unwrap_or_else(|| ThrowableInfo::new(head_name));
        for mut outer in iter {
            outer.cause = Some(Box::new(root));
            root = outer;
        }
        root
    }

    /// Number of throwables in the chain, this one included
    pub fn chain_len(&self) -> usize {
        let mut len = 1;
        let mut cause = self.cause.as_deref();
        while let Some(c) = cause {
            len += 1;
            cause = c.cause.as_deref();
        }
        len
    }
}

impl fmt::Display for ThrowableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.class_name, message),
            None => f.write_str(&self.class_name),
        }
    }
}

fn dyn_type_name(err: &(dyn Error + 'static)) -> &'static str {
    if err.is::<std::io::Error>() {
        any::type_name::<std::io::Error>()
    } else if err.is::<fmt::Error>() {
        any::type_name::<fmt::Error>()
    } else if err.is::<std::num::ParseIntError>() {
        any::type_name::<std::num::ParseIntError>()
    } else if err.is::<std::str::Utf8Error>() {
        any::type_name::<std::str::Utf8Error>()
    } else if err.is::<StoreError>() {
        any::type_name::<StoreError>()
    } else if err.is::<CodecError>() {
        any::type_name::<CodecError>()
    } else if err.is::<ChronologError>() {
        any::type_name::<ChronologError>()
    } else {
        "dyn std::error::Error"
    }
}
