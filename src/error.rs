/// Error type returned when formatting a single record.
///
/// Truncation (deep causal chains, oversized maps) is never an error; it is
/// handled in-band with sentinel entries. Everything here aborts the current
/// format call only and leaves the formatter usable for the next record.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// A field name reached the dispatcher that no handler is registered for.
    /// The caller passed a record shape this formatter does not understand.
    #[error("unknown record field: {0}")]
    UnknownField(String),

    /// A handler received a value of the wrong shape, e.g. a scalar where an
    /// iterable context/extra map was expected.
    #[error("field `{field}` has an unexpected shape, expected {expected}")]
    InvalidFieldValue { field: String, expected: &'static str },

    /// Severity code outside the fixed level table.
    #[error("severity code {0} is not in the level table")]
    UnknownLevel(u16),

    /// Batch formatting was invoked. CLEF emits exactly one record per line;
    /// batching belongs to the transport layer, so this call path must be
    /// unreachable in a correct integration.
    #[error("wrong code path: batch formatting is the transport's job")]
    WrongCodePath,

    /// JSON encoding of the output map failed.
    #[error("failed to encode output line: {0}")]
    Serialize(#[from] serde_json::Error),
}
