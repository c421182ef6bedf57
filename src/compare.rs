//! Tolerant structural comparison of expected vs. actual payloads.
//!
//! The comparison is a projection: only keys named by the expectation are
//! checked, extra keys in the actual map are ignored. `compare_results` never
//! panics; any shape it does not understand compares as unequal.

use serde_json::Value;

use crate::models::JsonMap;

/// Absolute tolerance for numeric comparison. Covers float drift introduced
/// by serial-date round trips and library-specific decimal handling.
pub const NUMERIC_TOLERANCE: f64 = 1e-4;

/// Compare an actual payload against an expectation.
///
/// Rules, applied recursively:
/// - only expected keys are checked (projection);
/// - an expected `null` passes iff the key is absent or `null` in actual;
/// - numbers match within [`NUMERIC_TOLERANCE`];
/// - `#RRGGBB` color strings compare case-insensitively;
/// - arrays are order-insensitive: every expected element must match some
///   distinct actual element (actual may hold extras);
/// - nested objects recurse with the same projection;
/// - a type mismatch is a plain `false`, never an error.
pub fn compare_results(expected: &JsonMap, actual: &JsonMap) -> bool {
    expected.iter().all(|(key, expected_value)| {
        match actual.get(key) {
            Some(actual_value) => values_match(expected_value, actual_value),
            // Absent actual key only satisfies an expected null.
            None => expected_value.is_null(),
        }
    })
}

fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(e), Value::Bool(a)) => e == a,
        (Value::Number(e), Value::Number(a)) => numbers_match(e, a),
        (Value::String(e), Value::String(a)) => strings_match(e, a),
        (Value::Array(e), Value::Array(a)) => arrays_match(e, a),
        (Value::Object(e), Value::Object(a)) => compare_results(e, a),
        _ => false,
    }
}

fn numbers_match(expected: &serde_json::Number, actual: &serde_json::Number) -> bool {
    match (expected.as_f64(), actual.as_f64()) {
        (Some(e), Some(a)) => (e - a).abs() <= NUMERIC_TOLERANCE,
        _ => false,
    }
}

fn is_hex_color(s: &str) -> bool {
    s.starts_with('#')
}

fn strings_match(expected: &str, actual: &str) -> bool {
    if is_hex_color(expected) && is_hex_color(actual) {
        expected.eq_ignore_ascii_case(actual)
    } else {
        expected == actual
    }
}

/// Order-insensitive subset match: each expected element consumes one distinct
/// actual element.
fn arrays_match(expected: &[Value], actual: &[Value]) -> bool {
    let mut used = vec![false; actual.len()];
    expected.iter().all(|e| {
        actual.iter().zip(used.iter_mut()).any(|(a, slot)| {
            if !*slot && values_match(e, a) {
                *slot = true;
                true
            } else {
                false
            }
        })
    })
}
