//! Integration tests for factorlsq-types.

use factorlsq_types::{Key, LsqError};

// ─── Key Tests ─────────────────────────────────────────────────

#[test]
fn key_raw() {
    let key = Key(42);
    assert_eq!(key.raw(), 42);
}

#[test]
fn keys_order_numerically() {
    let mut keys = vec![Key(10), Key(2), Key(7)];
    keys.sort();
    assert_eq!(keys, vec![Key(2), Key(7), Key(10)]);
}

#[test]
fn key_display() {
    assert_eq!(Key(3).to_string(), "x3");
}

#[test]
fn key_serializes_as_plain_integer() {
    let key = Key(100);
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, "100");
    let deserialized: Key = serde_json::from_str(&json).unwrap();
    assert_eq!(key, deserialized);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn unsupported_ordering_display() {
    let err = LsqError::UnsupportedOrdering("BOGUS".into());
    let msg = err.to_string();
    assert!(msg.contains("BOGUS"));
    assert!(msg.contains("COLAMD"));
}

#[test]
fn underdetermined_display() {
    let err = LsqError::Underdetermined { rows: 2, cols: 5 };
    let msg = err.to_string();
    assert!(msg.contains('2'));
    assert!(msg.contains('5'));
}

#[test]
fn io_error_converts() {
    fn read_missing() -> factorlsq_types::LsqResult<String> {
        Ok(std::fs::read_to_string("/definitely/not/a/real/path.json")?)
    }
    assert!(matches!(read_missing(), Err(LsqError::Io(_))));
}
