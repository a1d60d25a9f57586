//! Formatter integration harness.
//!
//! # What this covers
//!
//! - **End-to-end CLEF lines**: a full record formats to one line of JSON
//!   carrying `@t`, `@m`, `@l`, `Code`, `LevelName`, `Channel`.
//! - **Message templates**: a `{`-bearing message produces both `@m` and
//!   `@mt`.
//! - **Extraction policy**: context/extra entries land at the root or under
//!   `Context` / `Extra` depending on the flags, and never clobber derived
//!   fields.
//! - **Exception flattening**: the reserved `exception` context entry becomes
//!   the multi-line `@x` text and is not re-emitted as a property.
//! - **Bounding**: oversized maps and deep causal chains truncate with
//!   sentinels instead of failing.
//! - **Invariant traps**: batch formatting and unknown field names always
//!   fail.
//!
//! # Running
//!
//! ```sh
//! cargo test --test format_harness
//! ```

use chrono::{FixedOffset, TimeZone};
use pretty_assertions::assert_eq;
use seq_clef_formatter::{
    ContextValue, ExceptionInfo, FieldValue, FormatError, LogRecord, SeqCompactFormatter,
    SeqFormatter, CONTENT_TYPE, EXCEPTION_KEY,
};
use serde_json::{json, Value};

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn login_record() -> LogRecord {
    let mut record = LogRecord::new(
        "User {Id} logged in",
        200,
        "INFO",
        "auth",
        utc().with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    );
    record.context.insert("id", 42i64);
    record
}

fn parse_line(line: &str) -> Value {
    assert!(line.ends_with('\n'), "line must be newline terminated");
    let body = &line[..line.len() - 1];
    assert!(!body.contains('\n'), "line must be single-line JSON");
    serde_json::from_str(body).expect("line must be valid JSON")
}

#[test]
fn full_record_formats_to_a_single_clef_line() {
    let formatter = SeqCompactFormatter::default();
    let line = formatter.format(&login_record()).unwrap();
    let value = parse_line(&line);

    assert_eq!(value["@t"], json!("2024-01-01T00:00:00+0000"));
    assert_eq!(value["@m"], json!("User {Id} logged in"));
    assert_eq!(value["@mt"], json!("User {Id} logged in"));
    assert_eq!(value["@l"], json!("Information"));
    assert_eq!(value["Code"], json!(200));
    assert_eq!(value["LevelName"], json!("INFO"));
    assert_eq!(value["Channel"], json!("auth"));
    assert_eq!(value["Id"], json!(42));
}

#[test]
fn plain_message_has_no_template_field() {
    let formatter = SeqCompactFormatter::default();
    let mut record = login_record();
    record.message = "Hello, world".to_string();

    let value = parse_line(&formatter.format(&record).unwrap());
    assert_eq!(value["@m"], json!("Hello, world"));
    assert!(value.get("@mt").is_none());
}

#[test]
fn context_nests_when_extraction_is_off() {
    let formatter = SeqCompactFormatter::new(false, true);
    let mut record = login_record();
    record.context.insert("order_id", 42i64);

    let value = parse_line(&formatter.format(&record).unwrap());
    assert_eq!(value["Context"]["OrderId"], json!(42));
    assert!(value.get("OrderId").is_none());
}

#[test]
fn context_extracts_to_root_when_extraction_is_on() {
    let formatter = SeqCompactFormatter::default();
    let mut record = login_record();
    record.context.insert("order_id", 42i64);

    let value = parse_line(&formatter.format(&record).unwrap());
    assert_eq!(value["OrderId"], json!(42));
    assert!(value.get("Context").is_none());
}

#[test]
fn extra_follows_its_own_extraction_flag() {
    let formatter = SeqCompactFormatter::new(true, false);
    let mut record = login_record();
    record.extra.insert("host", "web-1");

    let value = parse_line(&formatter.format(&record).unwrap());
    assert_eq!(value["Extra"]["Host"], json!("web-1"));
    assert!(value.get("Host").is_none());
}

#[test]
fn extracted_entries_cannot_clobber_derived_fields() {
    let formatter = SeqCompactFormatter::default();
    let mut record = login_record();
    record.extra.insert("@m", "spoofed message");
    record.extra.insert("Code", 999i64);

    let value = parse_line(&formatter.format(&record).unwrap());
    assert_eq!(value["@m"], json!("User {Id} logged in"));
    assert_eq!(value["Code"], json!(200));
}

#[test]
fn exception_becomes_flattened_x_field() {
    let formatter = SeqCompactFormatter::default();
    let mut record = login_record();
    record.context.insert(
        EXCEPTION_KEY,
        ContextValue::Exception(Box::new(
            ExceptionInfo::new("RuntimeException", "db gone")
                .with_code(7)
                .with_location("src/db.rs", 21)
                .with_frame("src/db.rs", 21)
                .with_previous(
                    ExceptionInfo::new("IoError", "connection reset")
                        .with_location("src/io.rs", 3),
                ),
        )),
    );

    let value = parse_line(&formatter.format(&record).unwrap());
    let x = value["@x"].as_str().unwrap();
    assert!(x.contains("class: RuntimeException\n"));
    assert!(x.contains("message: db gone\n"));
    assert!(x.contains("file: src/db.rs:21\n"));
    assert!(x.contains("trace: src/db.rs:21\n"));
    assert!(x.contains("\tclass: IoError\n"));

    // consumed, never re-emitted as a property
    assert!(value.get("Exception").is_none());
    assert!(value.get(EXCEPTION_KEY).is_none());
}

#[test]
fn oversized_context_truncates_with_sentinel() {
    let formatter = SeqCompactFormatter::new(false, true);
    let mut record = login_record();
    for i in 0..1500i64 {
        record.context.insert(format!("key_{i}"), i);
    }

    let value = parse_line(&formatter.format(&record).unwrap());
    let context = value["Context"].as_object().unwrap();
    assert_eq!(context.len(), 1000);
    assert_eq!(
        context["..."],
        json!("Over 1000 items, aborting normalization")
    );
}

#[test]
fn deep_causal_chain_truncates_instead_of_failing() {
    let formatter = SeqCompactFormatter::default().with_max_normalize_depth(3);
    let mut chain = ExceptionInfo::new("E0", "m");
    for i in 1..=8 {
        chain = ExceptionInfo::new(format!("E{i}"), "m").with_previous(chain);
    }

    let mut record = login_record();
    record
        .context
        .insert(EXCEPTION_KEY, ContextValue::Exception(Box::new(chain)));

    let value = parse_line(&formatter.format(&record).unwrap());
    let x = value["@x"].as_str().unwrap();
    assert!(x.contains("Over 3 levels deep, aborting normalization"));
}

#[test]
fn batch_formatting_always_hits_the_trap() {
    let formatter = SeqCompactFormatter::default();
    assert!(matches!(
        formatter.format_batch(&[]),
        Err(FormatError::WrongCodePath)
    ));
    assert!(matches!(
        formatter.format_batch(&[login_record(), login_record()]),
        Err(FormatError::WrongCodePath)
    ));
}

#[test]
fn unknown_field_name_is_rejected() {
    let formatter = SeqCompactFormatter::default();
    let result =
        formatter.normalize_fields([("request_id", FieldValue::Text("abc"))]);
    assert!(matches!(result, Err(FormatError::UnknownField(name)) if name == "RequestId"));
}

#[test]
fn wrong_field_shape_is_rejected() {
    let formatter = SeqCompactFormatter::default();
    let result = formatter.normalize_fields([("context", FieldValue::Text("not a map"))]);
    assert!(matches!(
        result,
        Err(FormatError::InvalidFieldValue { field, .. }) if field == "context"
    ));
}

#[test]
fn content_type_is_the_clef_mime_type() {
    let formatter = SeqCompactFormatter::default();
    assert_eq!(formatter.content_type(), "application/vnd.serilog.clef");
    assert_eq!(formatter.content_type(), CONTENT_TYPE);
}

#[test]
fn formatter_state_survives_a_failed_call() {
    let formatter = SeqCompactFormatter::default();
    let mut bad = login_record();
    bad.level = 123;
    assert!(formatter.format(&bad).is_err());

    // the failure is scoped to that one record
    let value = parse_line(&formatter.format(&login_record()).unwrap());
    assert_eq!(value["@l"], json!("Information"));
}
