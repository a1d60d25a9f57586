use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::error::FormatError;
use crate::exception::{flatten_exception, normalize_exception};
use crate::fields::{bound_map, FieldName};
use crate::level::severity_name;
use crate::output::{OutputMap, CONTENT_TYPE};
use crate::record::{FieldValue, LogRecord, RecordMap};

/// Per-field hooks invoked by the dispatcher, plus the provided
/// orchestration that drives them.
///
/// Implementations decide how each field lands in the [`OutputMap`];
/// [`normalize_fields`](SeqFormatter::normalize_fields) is the shared
/// skeleton that resolves raw field names and routes values to the hooks.
/// [`SeqCompactFormatter`] is the CLEF implementation; other Seq payload
/// shapes can implement the same hooks without touching the orchestration.
pub trait SeqFormatter: Send + Sync {
    /// MIME content type of the payload this formatter produces, for the
    /// transport to put on the wire.
    fn content_type(&self) -> &'static str;

    fn process_message(&self, out: &mut OutputMap, message: &str) -> Result<(), FormatError>;
    fn process_context(&self, out: &mut OutputMap, context: &RecordMap) -> Result<(), FormatError>;
    fn process_level(&self, out: &mut OutputMap, level: u16) -> Result<(), FormatError>;
    fn process_level_name(
        &self,
        out: &mut OutputMap,
        level_name: &str,
    ) -> Result<(), FormatError>;
    fn process_channel(&self, out: &mut OutputMap, channel: &str) -> Result<(), FormatError>;
    fn process_datetime(
        &self,
        out: &mut OutputMap,
        datetime: DateTime<FixedOffset>,
    ) -> Result<(), FormatError>;
    fn process_extra(&self, out: &mut OutputMap, extra: &RecordMap) -> Result<(), FormatError>;

    /// Drive `(raw name, value)` pairs through their handlers in the order
    /// the caller supplies them. Unknown names and wrong-shaped values
    /// abort the call.
    fn normalize_fields<'a, I>(&self, fields: I) -> Result<OutputMap, FormatError>
    where
        Self: Sized,
        I: IntoIterator<Item = (&'a str, FieldValue<'a>)>,
    {
        let mut out = OutputMap::new();
        for (raw, value) in fields {
            match FieldName::resolve(raw)? {
                FieldName::Message => self.process_message(&mut out, value.as_text(raw)?)?,
                FieldName::Context => self.process_context(&mut out, value.as_map(raw)?)?,
                FieldName::Level => self.process_level(&mut out, value.as_code(raw)?)?,
                FieldName::LevelName => {
                    self.process_level_name(&mut out, value.as_text(raw)?)?
                }
                FieldName::Channel => self.process_channel(&mut out, value.as_text(raw)?)?,
                FieldName::Datetime => {
                    self.process_datetime(&mut out, value.as_timestamp(raw)?)?
                }
                FieldName::Extra => self.process_extra(&mut out, value.as_map(raw)?)?,
            }
        }
        Ok(out)
    }

    /// Format one record as a single newline-terminated CLEF line.
    fn format(&self, record: &LogRecord) -> Result<String, FormatError>
    where
        Self: Sized,
    {
        self.normalize_fields(record.fields())?.to_line()
    }

    /// Always fails: CLEF requires exactly one JSON object per line and
    /// batching belongs to the transport. This trap catches misuse by the
    /// surrounding pipeline.
    fn format_batch(&self, _records: &[LogRecord]) -> Result<String, FormatError> {
        Err(FormatError::WrongCodePath)
    }
}

/// CLEF implementation of [`SeqFormatter`].
///
/// `extract_context` and `extract_extras` choose between merging the
/// processed maps into the output root or nesting them under `Context` /
/// `Extra`. Configuration is read-only during formatting, so one instance
/// may serve concurrent format calls; the setters are construction-time
/// conveniences and require `&mut` access.
#[derive(Debug, Clone)]
pub struct SeqCompactFormatter {
    extract_context: bool,
    extract_extras: bool,
    max_normalize_depth: usize,
}

impl Default for SeqCompactFormatter {
    fn default() -> Self {
        SeqCompactFormatter::new(true, true)
    }
}

impl SeqCompactFormatter {
    /// Default cap on causal-chain recursion.
    pub const DEFAULT_MAX_NORMALIZE_DEPTH: usize = 9;

    pub fn new(extract_context: bool, extract_extras: bool) -> Self {
        SeqCompactFormatter {
            extract_context,
            extract_extras,
            max_normalize_depth: Self::DEFAULT_MAX_NORMALIZE_DEPTH,
        }
    }

    pub fn with_max_normalize_depth(mut self, depth: usize) -> Self {
        self.max_normalize_depth = depth;
        self
    }

    pub fn extract_context(&self) -> bool {
        self.extract_context
    }

    pub fn set_extract_context(&mut self, value: bool) -> &mut Self {
        self.extract_context = value;
        self
    }

    pub fn extract_extras(&self) -> bool {
        self.extract_extras
    }

    pub fn set_extract_extras(&mut self, value: bool) -> &mut Self {
        self.extract_extras = value;
        self
    }

    pub fn max_normalize_depth(&self) -> usize {
        self.max_normalize_depth
    }

    /// Turn the reserved exception entry of a context map into the `@x`
    /// field: structural normalization first, then flattening to the
    /// multi-line text CLEF expects.
    fn process_context_exception(&self, out: &mut OutputMap, context: &RecordMap) {
        if let Some(exception) = context.exception() {
            let normalized = normalize_exception(exception, 0, self.max_normalize_depth);
            out.set("@x", flatten_exception(normalized));
        }
    }
}

impl SeqFormatter for SeqCompactFormatter {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    fn process_message(&self, out: &mut OutputMap, message: &str) -> Result<(), FormatError> {
        out.set("@m", message);
        // A brace marks the text as a structured message template.
        if message.contains('{') {
            out.set("@mt", message);
        }
        Ok(())
    }

    fn process_context(&self, out: &mut OutputMap, context: &RecordMap) -> Result<(), FormatError> {
        self.process_context_exception(out, context);
        let bounded = bound_map(context.iter().filter(|(key, _)| !key.is_exception_key()));

        if self.extract_context {
            out.merge(bounded);
        } else {
            out.set("Context", Value::Object(bounded));
        }
        Ok(())
    }

    fn process_level(&self, out: &mut OutputMap, level: u16) -> Result<(), FormatError> {
        out.set("@l", severity_name(level)?);
        out.set("Code", level);
        Ok(())
    }

    fn process_level_name(
        &self,
        out: &mut OutputMap,
        level_name: &str,
    ) -> Result<(), FormatError> {
        out.set("LevelName", level_name);
        Ok(())
    }

    fn process_channel(&self, out: &mut OutputMap, channel: &str) -> Result<(), FormatError> {
        out.set("Channel", channel);
        Ok(())
    }

    fn process_datetime(
        &self,
        out: &mut OutputMap,
        datetime: DateTime<FixedOffset>,
    ) -> Result<(), FormatError> {
        // ISO-8601 with numeric offset, e.g. 2024-01-01T00:00:00+0000.
        out.set("@t", datetime.format("%Y-%m-%dT%H:%M:%S%z").to_string());
        Ok(())
    }

    fn process_extra(&self, out: &mut OutputMap, extra: &RecordMap) -> Result<(), FormatError> {
        let bounded = bound_map(extra.iter());

        if self.extract_extras {
            out.merge(bounded);
        } else {
            out.set("Extra", Value::Object(bounded));
        }
        Ok(())
    }
}
