//! Typed reconstruction of loosely-typed expected/actual maps.
//!
//! The wire format is key-presence-as-optionality JSON; comparison logic
//! should not have to reason about that. These functions build the strongly
//! typed intermediates (`CellValue`, `CellFormat`, `BorderInfo`) at the
//! boundary; the structs are used for one comparison and discarded.

use serde_json::Value;

use crate::dates;
use crate::models::{
    BorderEdge, BorderInfo, BorderStyle, CellFormat, CellScalar, CellType, CellValue, JsonMap,
};

/// Default edge color when an expectation names a style but no color.
pub const DEFAULT_BORDER_COLOR: &str = "#000000";

fn scalar_from_value(value: &Value) -> Option<CellScalar> {
    match value {
        Value::Bool(b) => Some(CellScalar::Bool(*b)),
        Value::Number(n) => n.as_f64().map(CellScalar::Number),
        Value::String(s) => Some(CellScalar::Text(s.clone())),
        _ => None,
    }
}

/// Build a [`CellValue`] from an expected map, dispatching on the `"type"`
/// key. Absence of `"type"` defaults to `string`; date/datetime values are
/// ISO-8601 text and get validated and re-canonicalized.
pub fn cell_value_from_expected(expected: &JsonMap) -> CellValue {
    let cell_type = expected
        .get("type")
        .and_then(Value::as_str)
        .map_or(CellType::String, CellType::from_name);

    let raw_value = expected.get("value");
    let formula = expected
        .get("formula")
        .and_then(Value::as_str)
        .map(String::from);

    let value = match cell_type {
        CellType::Blank => None,
        CellType::Date | CellType::Datetime => raw_value
            .and_then(Value::as_str)
            .and_then(dates::parse_iso)
            .map(|parts| CellScalar::Text(parts.to_iso()))
            .or_else(|| raw_value.and_then(scalar_from_value)),
        _ => raw_value.and_then(scalar_from_value),
    };

    CellValue {
        cell_type,
        value,
        formula,
    }
}

/// Build a [`CellValue`] from a raw scalar an adapter returned:
/// null maps to blank, bool to boolean, number to number, text to string.
pub fn cell_value_from_raw(raw: &Value) -> CellValue {
    match raw {
        Value::Null => CellValue::blank(),
        Value::Bool(b) => CellValue::boolean(*b),
        Value::Number(n) => n.as_f64().map_or_else(CellValue::blank, CellValue::number),
        Value::String(s) => CellValue::string(s.clone()),
        // Arrays/objects are not cell scalars; treat as blank.
        _ => CellValue::blank(),
    }
}

/// Extract each recognized format key independently. Unspecified keys stay
/// `None` ("don't care"), never a false-y default.
pub fn cell_format_from_expected(expected: &JsonMap) -> CellFormat {
    let get_bool = |key: &str| expected.get(key).and_then(Value::as_bool);
    let get_str = |key: &str| expected.get(key).and_then(Value::as_str).map(String::from);

    CellFormat {
        bold: get_bool("bold"),
        italic: get_bool("italic"),
        underline: get_bool("underline"),
        strikethrough: get_bool("strikethrough"),
        font_name: get_str("font_name"),
        font_size: expected.get("font_size").and_then(Value::as_f64),
        font_color: get_str("font_color"),
        bg_color: get_str("bg_color"),
        number_format: get_str("number_format"),
        h_align: get_str("h_align"),
        v_align: get_str("v_align"),
        wrap: get_bool("wrap"),
        rotation: expected
            .get("rotation")
            .and_then(Value::as_i64)
            .and_then(|r| i32::try_from(r).ok()),
        indent: expected
            .get("indent")
            .and_then(Value::as_i64)
            .and_then(|i| u32::try_from(i).ok()),
    }
}

/// Resolve one border edge from the expected map.
///
/// Per-edge keys (`border_top`, `border_top_color`) beat the uniform
/// `border_style`/`border_color` pair; a color with no style implies `thin`;
/// the default edge color is [`DEFAULT_BORDER_COLOR`]. Diagonal edges only
/// honor their per-edge keys.
fn edge_from_expected(expected: &JsonMap, edge: &str, uniform: bool) -> Option<BorderEdge> {
    let style_key = format!("border_{edge}");
    let color_key = format!("border_{edge}_color");

    let own_style = expected.get(&style_key).and_then(Value::as_str);
    let own_color = expected.get(&color_key).and_then(Value::as_str);

    let uniform_style = if uniform {
        expected.get("border_style").and_then(Value::as_str)
    } else {
        None
    };
    let uniform_color = if uniform {
        expected.get("border_color").and_then(Value::as_str)
    } else {
        None
    };

    let style = own_style.or(uniform_style);
    let color = own_color.or(uniform_color);

    if style.is_none() && color.is_none() {
        return None;
    }

    Some(BorderEdge {
        style: style.map_or(BorderStyle::Thin, BorderStyle::from_name),
        color: color.unwrap_or(DEFAULT_BORDER_COLOR).to_string(),
    })
}

/// Build a [`BorderInfo`] from the expected map. Edges with no applicable
/// key remain `None`, which the comparator treats as "don't care".
pub fn border_from_expected(expected: &JsonMap) -> BorderInfo {
    BorderInfo {
        top: edge_from_expected(expected, "top", true),
        bottom: edge_from_expected(expected, "bottom", true),
        left: edge_from_expected(expected, "left", true),
        right: edge_from_expected(expected, "right", true),
        diagonal_up: edge_from_expected(expected, "diagonal_up", false),
        diagonal_down: edge_from_expected(expected, "diagonal_down", false),
    }
}
