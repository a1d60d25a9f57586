use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::fmt;

use crate::error::FormatError;
use crate::exception::RecordException;

/// Reserved context key holding the record's error object. The entry is
/// consumed during normalization and never re-emitted as an ordinary
/// context property.
pub const EXCEPTION_KEY: &str = "exception";

/// Key of a context/extra entry. Integer keys mark positional (array-like)
/// members; string keys are PascalCased on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapKey {
    Int(i64),
    Str(String),
}

impl MapKey {
    pub(crate) fn is_exception_key(&self) -> bool {
        matches!(self, MapKey::Str(s) if s == EXCEPTION_KEY)
    }
}

impl From<i64> for MapKey {
    fn from(key: i64) -> Self {
        MapKey::Int(key)
    }
}

impl From<&str> for MapKey {
    fn from(key: &str) -> Self {
        MapKey::Str(key.to_string())
    }
}

impl From<String> for MapKey {
    fn from(key: String) -> Self {
        MapKey::Str(key)
    }
}

/// A single context/extra value: ordinary JSON data, or the error object
/// carried under the reserved [`EXCEPTION_KEY`].
pub enum ContextValue {
    Data(Value),
    Exception(Box<dyn RecordException>),
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Data(value) => f.debug_tuple("Data").field(value).finish(),
            ContextValue::Exception(e) => f.debug_tuple("Exception").field(e).finish(),
        }
    }
}

impl From<Value> for ContextValue {
    fn from(value: Value) -> Self {
        ContextValue::Data(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Data(Value::from(value))
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Data(Value::from(value))
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Data(Value::from(value))
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Data(Value::from(value))
    }
}

impl From<Box<dyn RecordException>> for ContextValue {
    fn from(e: Box<dyn RecordException>) -> Self {
        ContextValue::Exception(e)
    }
}

/// Insertion-ordered mapping used for a record's context and extra data.
/// Externally supplied, untyped, and possibly very large; bounding happens
/// during normalization, not on insert.
#[derive(Debug, Default)]
pub struct RecordMap {
    entries: Vec<(MapKey, ContextValue)>,
}

impl RecordMap {
    pub fn new() -> Self {
        RecordMap::default()
    }

    pub fn insert(&mut self, key: impl Into<MapKey>, value: impl Into<ContextValue>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &ContextValue)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// The error object stored under the reserved [`EXCEPTION_KEY`], if any.
    /// Non-error data under that key is consumed silently.
    pub fn exception(&self) -> Option<&dyn RecordException> {
        self.entries.iter().find_map(|(key, value)| {
            if !key.is_exception_key() {
                return None;
            }
            match value {
                ContextValue::Exception(e) => Some(e.as_ref()),
                ContextValue::Data(_) => None,
            }
        })
    }
}

impl<K: Into<MapKey>, V: Into<ContextValue>> FromIterator<(K, V)> for RecordMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RecordMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// One structured log record handed to the formatter. Exactly one message,
/// level, channel and timestamp; context and extra are free-form.
#[derive(Debug)]
pub struct LogRecord {
    pub message: String,
    pub level: u16,
    pub level_name: String,
    pub channel: String,
    pub datetime: DateTime<FixedOffset>,
    pub context: RecordMap,
    pub extra: RecordMap,
}

impl LogRecord {
    pub fn new(
        message: impl Into<String>,
        level: u16,
        level_name: impl Into<String>,
        channel: impl Into<String>,
        datetime: DateTime<FixedOffset>,
    ) -> Self {
        LogRecord {
            message: message.into(),
            level,
            level_name: level_name.into(),
            channel: channel.into(),
            datetime,
            context: RecordMap::new(),
            extra: RecordMap::new(),
        }
    }

    /// The record's fields as `(raw name, value)` pairs in Monolog record
    /// order, ready for the dispatcher.
    pub fn fields(&self) -> [(&'static str, FieldValue<'_>); 7] {
        [
            ("message", FieldValue::Text(&self.message)),
            ("context", FieldValue::Map(&self.context)),
            ("level", FieldValue::Code(self.level)),
            ("level_name", FieldValue::Text(&self.level_name)),
            ("channel", FieldValue::Text(&self.channel)),
            ("datetime", FieldValue::Timestamp(self.datetime)),
            ("extra", FieldValue::Map(&self.extra)),
        ]
    }
}

/// Borrowed view of one record field as handed to the dispatcher.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Code(u16),
    Timestamp(DateTime<FixedOffset>),
    Map(&'a RecordMap),
}

impl<'a> FieldValue<'a> {
    pub fn as_text(&self, field: &str) -> Result<&'a str, FormatError> {
        match self {
            FieldValue::Text(text) => Ok(text),
            _ => Err(shape_error(field, "text")),
        }
    }

    pub fn as_code(&self, field: &str) -> Result<u16, FormatError> {
        match self {
            FieldValue::Code(code) => Ok(*code),
            _ => Err(shape_error(field, "an integer severity code")),
        }
    }

    pub fn as_timestamp(&self, field: &str) -> Result<DateTime<FixedOffset>, FormatError> {
        match self {
            FieldValue::Timestamp(datetime) => Ok(*datetime),
            _ => Err(shape_error(field, "a date-time with offset")),
        }
    }

    pub fn as_map(&self, field: &str) -> Result<&'a RecordMap, FormatError> {
        match self {
            FieldValue::Map(map) => Ok(map),
            _ => Err(shape_error(field, "an iterable key-value map")),
        }
    }
}

fn shape_error(field: &str, expected: &'static str) -> FormatError {
    FormatError::InvalidFieldValue {
        field: field.to_string(),
        expected,
    }
}
