use serde_json::{Map, Value};
use std::fmt;

/// Line separator used in the flattened `@x` text.
#[cfg(windows)]
pub(crate) const LINE_SEP: &str = "\r\n";
#[cfg(not(windows))]
pub(crate) const LINE_SEP: &str = "\n";

/// One stack frame. Frames without a known source file are kept here but
/// skipped by the normalizer, which only emits `file:line` locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub file: Option<String>,
    pub line: u32,
}

/// Transport-fault details carried by interop error types (SOAP-style
/// faults). All parts are optional; only the ones present are emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaultInfo {
    pub code: Option<String>,
    pub actor: Option<String>,
    /// Free-form fault payload. Non-string values are embedded as compact
    /// JSON text rather than nested structure.
    pub detail: Option<Value>,
}

/// Capability surface the normalizer reads off an error object.
///
/// `to_json` is the self-serialization hook: an error that knows its own
/// structured shape returns it there and the structural walk is skipped
/// entirely. `fault` exposes transport-fault fields for non-native error
/// types; both default to "not supported".
pub trait RecordException: fmt::Debug + Send + Sync {
    fn class_name(&self) -> &str;
    fn message(&self) -> &str;
    fn code(&self) -> i64;
    /// Source file the error was raised in.
    fn file(&self) -> &str;
    fn line(&self) -> u32;
    fn trace(&self) -> &[TraceFrame] {
        &[]
    }
    /// Causal predecessor, walked outermost to innermost.
    fn previous(&self) -> Option<&dyn RecordException> {
        None
    }
    fn to_json(&self) -> Option<Value> {
        None
    }
    fn fault(&self) -> Option<&FaultInfo> {
        None
    }
}

/// Owned error data implementing [`RecordException`]. This is the shape
/// callers build when they have no richer error type to hand over.
#[derive(Debug, Default)]
pub struct ExceptionInfo {
    pub class_name: String,
    pub message: String,
    pub code: i64,
    pub file: String,
    pub line: u32,
    pub trace: Vec<TraceFrame>,
    pub fault: Option<FaultInfo>,
    pub previous: Option<Box<dyn RecordException>>,
    /// Pre-built structured form returned from the `to_json` hook, if any.
    pub own_json: Option<Value>,
}

impl ExceptionInfo {
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionInfo {
            class_name: class_name.into(),
            message: message.into(),
            ..ExceptionInfo::default()
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    pub fn with_frame(mut self, file: impl Into<String>, line: u32) -> Self {
        self.trace.push(TraceFrame {
            file: Some(file.into()),
            line,
        });
        self
    }

    pub fn with_previous(mut self, previous: ExceptionInfo) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    pub fn with_fault(mut self, fault: FaultInfo) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn with_own_json(mut self, json: Value) -> Self {
        self.own_json = Some(json);
        self
    }
}

impl RecordException for ExceptionInfo {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> i64 {
        self.code
    }

    fn file(&self) -> &str {
        &self.file
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn trace(&self) -> &[TraceFrame] {
        &self.trace
    }

    fn previous(&self) -> Option<&dyn RecordException> {
        self.previous.as_deref()
    }

    fn to_json(&self) -> Option<Value> {
        self.own_json.clone()
    }

    fn fault(&self) -> Option<&FaultInfo> {
        self.fault.as_ref()
    }
}

/// Recursively normalize an error and its causal chain into a JSON
/// structure: `{class, message, code, file, [fault fields,] trace,
/// previous}`.
///
/// Once `depth` passes `max_depth` the walk stops and a single-element
/// sentinel array describing the truncation is returned in place of the
/// remaining chain, bounding both stack depth and output size.
pub fn normalize_exception(e: &dyn RecordException, depth: usize, max_depth: usize) -> Value {
    if depth > max_depth {
        tracing::debug!(max_depth, "causal chain exceeds depth cap, truncating");
        return Value::Array(vec![Value::String(format!(
            "Over {max_depth} levels deep, aborting normalization"
        ))]);
    }

    if let Some(own) = e.to_json() {
        return own;
    }

    let mut data = Map::new();
    data.insert("class".to_string(), Value::from(e.class_name()));
    data.insert("message".to_string(), Value::from(e.message()));
    data.insert("code".to_string(), Value::from(e.code()));
    data.insert(
        "file".to_string(),
        Value::from(format!("{}:{}", e.file(), e.line())),
    );

    if let Some(fault) = e.fault() {
        if let Some(code) = &fault.code {
            data.insert("faultcode".to_string(), Value::from(code.as_str()));
        }
        if let Some(actor) = &fault.actor {
            data.insert("faultactor".to_string(), Value::from(actor.as_str()));
        }
        if let Some(detail) = &fault.detail {
            let rendered = match detail {
                Value::String(s) => s.clone(),
                other => serde_json::to_string(other).unwrap_or_else(|_| "{}".to_string()),
            };
            data.insert("detail".to_string(), Value::from(rendered));
        }
    }

    let locations: Vec<Value> = e
        .trace()
        .iter()
        .filter_map(|frame| {
            frame
                .file
                .as_ref()
                .map(|file| Value::from(format!("{}:{}", file, frame.line)))
        })
        .collect();
    if !locations.is_empty() {
        data.insert("trace".to_string(), Value::Array(locations));
    }

    if let Some(previous) = e.previous() {
        data.insert(
            "previous".to_string(),
            normalize_exception(previous, depth + 1, max_depth),
        );
    }

    Value::Object(data)
}

/// Flatten a normalized exception structure into the multi-line `@x` text.
///
/// Trace arrays are joined with the line separator; the `previous` subtree is
/// rewritten as tab-indented `key: value` lines with non-scalar values as
/// compact JSON. The result is one `key: value` line per top-level entry,
/// each terminated by [`LINE_SEP`].
pub fn flatten_exception(normalized: Value) -> String {
    let mut map = match normalized {
        Value::Object(map) => map,
        // Self-serialized or truncated shapes that are not objects render
        // as a single line.
        other => return format!("{}{}", render_value(&other), LINE_SEP),
    };

    let rendered_previous = match map.get_mut("previous") {
        Some(Value::Object(previous)) => {
            join_trace_in_place(previous);
            let mut rendered = String::new();
            for (key, value) in previous.iter() {
                rendered.push('\t');
                rendered.push_str(key);
                rendered.push_str(": ");
                rendered.push_str(&render_value(value));
                rendered.push_str(LINE_SEP);
            }
            Some(rendered)
        }
        _ => None,
    };
    if let Some(rendered) = rendered_previous {
        // insert on an existing key keeps its position
        map.insert("previous".to_string(), Value::from(rendered));
    }

    join_trace_in_place(&mut map);

    let mut out = String::new();
    for (key, value) in map.iter() {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&render_value(value));
        out.push_str(LINE_SEP);
    }
    out
}

fn join_trace_in_place(map: &mut Map<String, Value>) {
    if let Some(trace) = map.get_mut("trace") {
        if let Value::Array(locations) = trace {
            let joined = locations
                .iter()
                .map(render_value)
                .collect::<Vec<_>>()
                .join(LINE_SEP);
            *trace = Value::from(joined);
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "{}".to_string()),
    }
}
