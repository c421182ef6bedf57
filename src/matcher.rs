//! Locating the artifact an expectation describes among everything a sheet
//! actually holds.
//!
//! Libraries report conditional formats and validations in arbitrary order,
//! often with extras the fixture never authored. The matchers here pick the
//! candidate the expectation is about; the comparator then judges it.

use std::borrow::Cow;

use serde_json::Value;

use crate::models::JsonMap;
use crate::normalize::{normalize_formula, normalize_range};

fn ranges_equal(a: &str, b: &str) -> bool {
    normalize_range(a) == normalize_range(b)
}

fn formulas_equal(a: &str, b: &str) -> bool {
    normalize_formula(a) == normalize_formula(b)
}

fn str_key<'a>(map: &'a JsonMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Identity check shared by rules and validations: range (anchors stripped),
/// the type key, and a formula key (normalized) must each agree when the
/// expectation names them.
fn candidate_matches(
    candidate: &JsonMap,
    expected: &JsonMap,
    type_key: &str,
    formula_key: &str,
) -> bool {
    if let Some(want) = str_key(expected, "range") {
        match str_key(candidate, "range") {
            Some(got) if ranges_equal(want, got) => {}
            _ => return false,
        }
    }
    if let Some(want) = str_key(expected, type_key) {
        if str_key(candidate, type_key) != Some(want) {
            return false;
        }
    }
    if let Some(want) = str_key(expected, formula_key) {
        match str_key(candidate, formula_key) {
            Some(got) if formulas_equal(want, got) => {}
            _ => return false,
        }
    }
    true
}

/// Find the conditional-formatting rule an expectation describes. Identity
/// keys are `range`, `rule_type`, and `formula`; first match wins.
pub fn find_rule<'a>(rules: &'a [JsonMap], expected: &JsonMap) -> Option<&'a JsonMap> {
    rules
        .iter()
        .find(|rule| candidate_matches(rule, expected, "rule_type", "formula"))
}

/// Find the data-validation rule an expectation describes. Identity keys are
/// `range`, `validation_type`, and `formula1`.
pub fn find_validation<'a>(
    validations: &'a [JsonMap],
    expected: &JsonMap,
) -> Option<&'a JsonMap> {
    validations
        .iter()
        .find(|v| candidate_matches(v, expected, "validation_type", "formula1"))
}

/// Project an actual artifact onto the expectation's key set.
///
/// The `path` key is the one exception to strict projection: image paths
/// never survive a write/read round trip, so an absent actual `path` falls
/// back to the expected value and the comparison reduces to presence.
pub fn project_rule(actual: &JsonMap, expected: &JsonMap) -> JsonMap {
    let mut projected = JsonMap::new();
    for (key, expected_value) in expected {
        match actual.get(key) {
            Some(value) => {
                projected.insert(key.clone(), value.clone());
            }
            None if key == "path" => {
                projected.insert(key.clone(), expected_value.clone());
            }
            None => {}
        }
    }
    projected
}

/// Remove the `priority` key from a nested `cf_rule` expectation.
///
/// Priorities are renumbered freely by writers; an expectation that carries
/// one cannot be checked after a round trip. Returns the input unchanged
/// (borrowed) when there is nothing to strip.
pub fn strip_cf_priority(expected: &JsonMap) -> Cow<'_, JsonMap> {
    let has_priority = expected
        .get("cf_rule")
        .and_then(Value::as_object)
        .is_some_and(|rule| rule.contains_key("priority"));
    if !has_priority {
        return Cow::Borrowed(expected);
    }

    let mut stripped = expected.clone();
    if let Some(Value::Object(rule)) = stripped.get_mut("cf_rule") {
        rule.remove("priority");
    }
    Cow::Owned(stripped)
}
