//! Record codecs
//!
//! [`BinaryCodec`] is lossless for everything but arbitrary objects, which
//! travel as their text rendering. [`TextCodec`] writes one readable line per
//! event and cannot restore arguments or structured throwables.

mod binary;
mod format;
mod text;
mod wire;

pub use binary::BinaryCodec;
pub use format::format_message;
pub use text::TextCodec;

use chronolog_core::{LogCodec, RecordFormat, RegistryConfig, Result};

/// Build the codec for `format` with the limits from `config`
pub fn for_format(format: RecordFormat, config: &RegistryConfig) -> Result<Box<dyn LogCodec>> {
    match format {
        RecordFormat::Binary => {
            let mut codec = BinaryCodec::new();
            if let Some(depth) = config.stack_trace_depth {
                codec = codec.with_stack_trace_depth(depth);
            }
            if let Some(max) = config.max_arg_count {
                codec = codec.with_max_arg_count(max);
            }
            Ok(Box::new(codec))
        }
        RecordFormat::Text => {
            let mut codec = TextCodec::new(config.date_format.clone())?;
            if let Some(depth) = config.stack_trace_depth {
                codec = codec.with_stack_trace_depth(depth);
            }
            Ok(Box::new(codec))
        }
    }
}
