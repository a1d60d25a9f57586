use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::FormatError;

/// MIME content type of a CLEF payload.
pub const CONTENT_TYPE: &str = "application/vnd.serilog.clef";

/// Ordered output map for one record, owned by a single format call.
///
/// The CLEF-reserved `@`-prefixed keys live alongside PascalCased user
/// properties; the two namespaces cannot collide because PascalCasing never
/// produces an `@` prefix. Handlers write derived fields through [`set`],
/// which replaces; extracted context/extra entries go through [`merge`],
/// which never overwrites a field another handler already wrote.
///
/// [`set`]: OutputMap::set
/// [`merge`]: OutputMap::merge
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct OutputMap {
    entries: Map<String, Value>,
}

impl OutputMap {
    pub fn new() -> Self {
        OutputMap::default()
    }

    /// Write a derived field, replacing any same-named entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Merge processed context/extra entries into the root. Existing entries
    /// win, so user data cannot overwrite reserved or derived fields.
    pub fn merge(&mut self, values: Map<String, Value>) {
        for (key, value) in values {
            self.entries.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the map as one compact, newline-terminated CLEF line.
    pub fn to_line(&self) -> Result<String, FormatError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.entries
    }
}
