use serde_json::{Map, Value};

use crate::casing::to_pascal_case;
use crate::error::FormatError;
use crate::record::{ContextValue, MapKey};

/// Copy cap for user-supplied maps; everything past it is replaced by a
/// single sentinel entry.
const MAX_MAP_ITEMS: usize = 1000;

const TRUNCATION_KEY: &str = "...";
const TRUNCATION_MESSAGE: &str = "Over 1000 items, aborting normalization";

/// The record fields the dispatcher knows how to route, one handler each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    Message,
    Context,
    Level,
    LevelName,
    Channel,
    Datetime,
    Extra,
}

impl FieldName {
    /// Look up a handler by canonical (PascalCase) field name.
    pub fn from_canonical(name: &str) -> Option<FieldName> {
        match name {
            "Message" => Some(FieldName::Message),
            "Context" => Some(FieldName::Context),
            "Level" => Some(FieldName::Level),
            "LevelName" => Some(FieldName::LevelName),
            "Channel" => Some(FieldName::Channel),
            "Datetime" => Some(FieldName::Datetime),
            "Extra" => Some(FieldName::Extra),
            _ => None,
        }
    }

    /// PascalCase a raw record field name and resolve its handler. A name
    /// with no handler means the caller passed a record shape this
    /// formatter does not understand.
    pub fn resolve(raw: &str) -> Result<FieldName, FormatError> {
        let canonical = to_pascal_case(raw);
        FieldName::from_canonical(&canonical).ok_or(FormatError::UnknownField(canonical))
    }
}

/// Bound and PascalCase a context/extra map.
///
/// Entries are copied in original order; after 999 the sentinel entry is
/// appended and copying stops. Integer-keyed entries become positional
/// members under sequential decimal keys (`"0"`, `"1"`, …), so a mixed
/// int/string map yields a hybrid object with both positional and named
/// members.
pub fn bound_map<'a, I>(entries: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a MapKey, &'a ContextValue)>,
{
    let mut bounded = Map::new();
    let mut next_index: u64 = 0;
    let mut count = 1usize;

    for (key, value) in entries {
        if count >= MAX_MAP_ITEMS {
            tracing::debug!("map has over {MAX_MAP_ITEMS} items, truncating");
            bounded.insert(TRUNCATION_KEY.to_string(), Value::from(TRUNCATION_MESSAGE));
            break;
        }
        count += 1;

        match key {
            MapKey::Int(_) => {
                bounded.insert(next_index.to_string(), render_value(value));
                next_index += 1;
            }
            MapKey::Str(name) => {
                bounded.insert(to_pascal_case(name), render_value(value));
            }
        }
    }

    bounded
}

fn render_value(value: &ContextValue) -> Value {
    match value {
        ContextValue::Data(data) => data.clone(),
        // An error object outside the reserved exception slot carries no
        // structural meaning; keep a short readable form.
        ContextValue::Exception(e) => Value::from(format!("{}: {}", e.class_name(), e.message())),
    }
}
