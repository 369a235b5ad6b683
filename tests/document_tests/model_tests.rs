//! Tests for Document
//!
//! These tests verify:
//! - Construction and accessors
//! - Write validation (id, null payload)
//! - Serde shape used by the CLI import format

use atlasdoc::{DataStoreError, Document, ErrorCode};
use serde_json::{json, Value};

#[test]
fn test_document_accessors() {
    let doc = Document::new("doc1", 42, json!({ "a": 1 }));

    assert_eq!(doc.id(), "doc1");
    assert_eq!(doc.timestamp(), 42);
    assert_eq!(doc.data(), &json!({ "a": 1 }));

    let (id, timestamp, data) = doc.into_parts();
    assert_eq!(id, "doc1");
    assert_eq!(timestamp, 42);
    assert_eq!(data["a"], 1);
}

#[test]
fn test_validate_accepts_zero_and_negative_timestamps() {
    assert!(Document::new("doc", 0, json!(1)).validate().is_ok());
    assert!(Document::new("doc", -5, json!("x")).validate().is_ok());
}

#[test]
fn test_validate_accepts_non_object_payloads() {
    for data in [json!([]), json!(false), json!(0), json!(""), json!({})] {
        assert!(Document::new("doc", 1, data).validate().is_ok());
    }
}

#[test]
fn test_validate_rejects_null_data() {
    let err = Document::new("doc", 1, Value::Null).validate().unwrap_err();
    assert!(matches!(err, DataStoreError::InvalidDocument(_)));
    assert_eq!(err.code(), ErrorCode::InvalidDocument);
}

#[test]
fn test_validate_rejects_empty_id() {
    let err = Document::new("", 1, json!({})).validate().unwrap_err();
    assert!(matches!(err, DataStoreError::InvalidDocument(_)));
}

#[test]
fn test_validate_rejects_separator_in_id() {
    let err = Document::new("a:b", 1, json!({})).validate().unwrap_err();
    assert!(matches!(err, DataStoreError::InvalidDocument(_)));
}

#[test]
fn test_document_json_shape() {
    let doc: Document =
        serde_json::from_str(r#"{"id":"d1","timestamp":7,"data":{"k":"v"}}"#).unwrap();

    assert_eq!(doc, Document::new("d1", 7, json!({ "k": "v" })));
}
