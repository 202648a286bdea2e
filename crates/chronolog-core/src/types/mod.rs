pub mod event;
pub mod level;
pub mod throwable;

pub use event::{current_thread_name, Arg, LogEvent, BINARY_VERSION, MAX_NAME_BYTES};
pub use level::Level;
pub use throwable::{StackFrame, ThrowableInfo, MAX_CAUSE_DEPTH};
