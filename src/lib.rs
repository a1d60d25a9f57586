//! Formats structured log records as Seq's Compact Log Event Format:
//! one compact JSON object per line with `@`-prefixed reserved fields
//! (`@t`, `@m`, `@mt`, `@l`, `@x`) and PascalCased user properties.

pub mod casing;
pub mod error;
pub mod exception;
pub mod fields;
pub mod formatter;
pub mod level;
pub mod output;
pub mod record;

pub use error::FormatError;
pub use exception::{ExceptionInfo, FaultInfo, RecordException, TraceFrame};
pub use formatter::{SeqCompactFormatter, SeqFormatter};
pub use output::{OutputMap, CONTENT_TYPE};
pub use record::{ContextValue, FieldValue, LogRecord, MapKey, RecordMap, EXCEPTION_KEY};
