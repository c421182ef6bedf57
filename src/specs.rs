//! Expectation builders for tier-2 features.
//!
//! Each spec describes one authored artifact (a merge, a rule, a hyperlink,
//! ...) and renders itself into the wire-format expected map via
//! `to_expected()`. Unset optional fields produce no key at all — absence
//! means "don't care" to the comparator.

use serde_json::Value;

use crate::models::JsonMap;

fn put_str(map: &mut JsonMap, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.into(), Value::String(v.clone()));
    }
}

fn put_bool(map: &mut JsonMap, key: &str, value: Option<bool>) {
    if let Some(v) = value {
        map.insert(key.into(), Value::Bool(v));
    }
}

fn put_int(map: &mut JsonMap, key: &str, value: Option<i64>) {
    if let Some(v) = value {
        map.insert(key.into(), Value::Number(v.into()));
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn get_str(map: &JsonMap, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

fn get_bool(map: &JsonMap, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

fn get_int(map: &JsonMap, key: &str) -> Option<i64> {
    map.get(key).and_then(Value::as_i64)
}

fn get_strings(map: &JsonMap, key: &str) -> Vec<String> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// A merged cell range and the content expectations around it.
#[derive(Clone, Debug, Default)]
pub struct MergeSpec {
    pub range: String,
    pub top_left_value: Option<String>,
    pub non_top_left_nonempty: Option<i64>,
    pub top_left_bg_color: Option<String>,
    pub non_top_left_bg_color: Option<String>,
}

impl MergeSpec {
    /// Inverse of [`Self::to_expected`]; `None` when the map describes no merge.
    pub fn from_expected(expected: &JsonMap) -> Option<Self> {
        Some(Self {
            range: get_str(expected, "merged_range")?,
            top_left_value: get_str(expected, "top_left_value"),
            non_top_left_nonempty: get_int(expected, "non_top_left_nonempty"),
            top_left_bg_color: get_str(expected, "top_left_bg_color"),
            non_top_left_bg_color: get_str(expected, "non_top_left_bg_color"),
        })
    }

    pub fn to_expected(&self) -> JsonMap {
        let mut map = JsonMap::new();
        map.insert("merged_range".into(), Value::String(self.range.clone()));
        put_str(&mut map, "top_left_value", &self.top_left_value);
        put_int(&mut map, "non_top_left_nonempty", self.non_top_left_nonempty);
        put_str(&mut map, "top_left_bg_color", &self.top_left_bg_color);
        put_str(&mut map, "non_top_left_bg_color", &self.non_top_left_bg_color);
        map
    }
}

/// One conditional-formatting rule.
#[derive(Clone, Debug, Default)]
pub struct ConditionalFormatSpec {
    pub range: String,
    pub rule_type: String,
    pub operator: Option<String>,
    pub formula: Option<String>,
    pub priority: Option<i64>,
    pub stop_if_true: Option<bool>,
    pub format: Option<JsonMap>,
}

impl ConditionalFormatSpec {
    pub fn from_expected(expected: &JsonMap) -> Option<Self> {
        let rule = expected.get("cf_rule").and_then(Value::as_object)?;
        Some(Self {
            range: get_str(rule, "range")?,
            rule_type: get_str(rule, "rule_type")?,
            operator: get_str(rule, "operator"),
            formula: get_str(rule, "formula"),
            priority: get_int(rule, "priority"),
            stop_if_true: get_bool(rule, "stop_if_true"),
            format: rule.get("format").and_then(Value::as_object).cloned(),
        })
    }

    pub fn to_expected(&self) -> JsonMap {
        let mut rule = JsonMap::new();
        rule.insert("range".into(), Value::String(self.range.clone()));
        rule.insert("rule_type".into(), Value::String(self.rule_type.clone()));
        put_str(&mut rule, "operator", &self.operator);
        put_str(&mut rule, "formula", &self.formula);
        put_int(&mut rule, "priority", self.priority);
        put_bool(&mut rule, "stop_if_true", self.stop_if_true);
        if let Some(fmt) = &self.format {
            rule.insert("format".into(), Value::Object(fmt.clone()));
        }
        let mut map = JsonMap::new();
        map.insert("cf_rule".into(), Value::Object(rule));
        map
    }
}

/// One data-validation rule.
#[derive(Clone, Debug, Default)]
pub struct DataValidationSpec {
    pub range: String,
    pub validation_type: String,
    pub operator: Option<String>,
    pub formula1: Option<String>,
    pub formula2: Option<String>,
    pub allow_blank: Option<bool>,
    pub show_input: Option<bool>,
    pub show_error: Option<bool>,
    pub prompt_title: Option<String>,
    pub prompt: Option<String>,
    pub error_title: Option<String>,
    pub error: Option<String>,
}

impl DataValidationSpec {
    pub fn from_expected(expected: &JsonMap) -> Option<Self> {
        let v = expected.get("validation").and_then(Value::as_object)?;
        Some(Self {
            range: get_str(v, "range")?,
            validation_type: get_str(v, "validation_type")?,
            operator: get_str(v, "operator"),
            formula1: get_str(v, "formula1"),
            formula2: get_str(v, "formula2"),
            allow_blank: get_bool(v, "allow_blank"),
            show_input: get_bool(v, "show_input"),
            show_error: get_bool(v, "show_error"),
            prompt_title: get_str(v, "prompt_title"),
            prompt: get_str(v, "prompt"),
            error_title: get_str(v, "error_title"),
            error: get_str(v, "error"),
        })
    }

    pub fn to_expected(&self) -> JsonMap {
        let mut v = JsonMap::new();
        v.insert("range".into(), Value::String(self.range.clone()));
        v.insert(
            "validation_type".into(),
            Value::String(self.validation_type.clone()),
        );
        put_str(&mut v, "operator", &self.operator);
        put_str(&mut v, "formula1", &self.formula1);
        put_str(&mut v, "formula2", &self.formula2);
        put_bool(&mut v, "allow_blank", self.allow_blank);
        put_bool(&mut v, "show_input", self.show_input);
        put_bool(&mut v, "show_error", self.show_error);
        put_str(&mut v, "prompt_title", &self.prompt_title);
        put_str(&mut v, "prompt", &self.prompt);
        put_str(&mut v, "error_title", &self.error_title);
        put_str(&mut v, "error", &self.error);
        let mut map = JsonMap::new();
        map.insert("validation".into(), Value::Object(v));
        map
    }
}

/// A hyperlink on one cell.
#[derive(Clone, Debug, Default)]
pub struct HyperlinkSpec {
    pub cell: String,
    pub target: String,
    pub display: Option<String>,
    pub tooltip: Option<String>,
    pub internal: Option<bool>,
}

impl HyperlinkSpec {
    pub fn from_expected(expected: &JsonMap) -> Option<Self> {
        let h = expected.get("hyperlink").and_then(Value::as_object)?;
        Some(Self {
            cell: get_str(h, "cell")?,
            target: get_str(h, "target")?,
            display: get_str(h, "display"),
            tooltip: get_str(h, "tooltip"),
            internal: get_bool(h, "internal"),
        })
    }

    pub fn to_expected(&self) -> JsonMap {
        let mut h = JsonMap::new();
        h.insert("cell".into(), Value::String(self.cell.clone()));
        h.insert("target".into(), Value::String(self.target.clone()));
        put_str(&mut h, "display", &self.display);
        put_str(&mut h, "tooltip", &self.tooltip);
        put_bool(&mut h, "internal", self.internal);
        let mut map = JsonMap::new();
        map.insert("hyperlink".into(), Value::Object(h));
        map
    }
}

/// An image anchored at a cell. The `path` key never round-trips through a
/// written file; the matcher falls back to the expectation's value for it.
#[derive(Clone, Debug, Default)]
pub struct ImageSpec {
    pub cell: String,
    pub path: String,
    pub anchor: Option<String>,
    pub offset: Option<(i64, i64)>,
    pub alt_text: Option<String>,
}

impl ImageSpec {
    pub fn from_expected(expected: &JsonMap) -> Option<Self> {
        let img = expected.get("image").and_then(Value::as_object)?;
        let offset = img.get("offset").and_then(Value::as_array).and_then(|xy| {
            match (xy.first().and_then(Value::as_i64), xy.get(1).and_then(Value::as_i64)) {
                (Some(x), Some(y)) => Some((x, y)),
                _ => None,
            }
        });
        Some(Self {
            cell: get_str(img, "cell")?,
            path: get_str(img, "path")?,
            anchor: get_str(img, "anchor"),
            offset,
            alt_text: get_str(img, "alt_text"),
        })
    }

    pub fn to_expected(&self) -> JsonMap {
        let mut img = JsonMap::new();
        img.insert("cell".into(), Value::String(self.cell.clone()));
        img.insert("path".into(), Value::String(self.path.clone()));
        put_str(&mut img, "anchor", &self.anchor);
        if let Some((x, y)) = self.offset {
            img.insert(
                "offset".into(),
                Value::Array(vec![Value::Number(x.into()), Value::Number(y.into())]),
            );
        }
        put_str(&mut img, "alt_text", &self.alt_text);
        let mut map = JsonMap::new();
        map.insert("image".into(), Value::Object(img));
        map
    }
}

/// A pivot table definition.
#[derive(Clone, Debug, Default)]
pub struct PivotSpec {
    pub name: String,
    pub source_range: String,
    pub target_cell: String,
    pub row_fields: Vec<String>,
    pub column_fields: Vec<String>,
    pub data_fields: Vec<String>,
    pub filter_fields: Option<Vec<String>>,
}

impl PivotSpec {
    pub fn from_expected(expected: &JsonMap) -> Option<Self> {
        let p = expected.get("pivot").and_then(Value::as_object)?;
        Some(Self {
            name: get_str(p, "name")?,
            source_range: get_str(p, "source_range")?,
            target_cell: get_str(p, "target_cell")?,
            row_fields: get_strings(p, "row_fields"),
            column_fields: get_strings(p, "column_fields"),
            data_fields: get_strings(p, "data_fields"),
            filter_fields: p
                .get("filter_fields")
                .map(|_| get_strings(p, "filter_fields")),
        })
    }

    pub fn to_expected(&self) -> JsonMap {
        let mut p = JsonMap::new();
        p.insert("name".into(), Value::String(self.name.clone()));
        p.insert(
            "source_range".into(),
            Value::String(self.source_range.clone()),
        );
        p.insert("target_cell".into(), Value::String(self.target_cell.clone()));
        p.insert("row_fields".into(), string_list(&self.row_fields));
        p.insert("column_fields".into(), string_list(&self.column_fields));
        p.insert("data_fields".into(), string_list(&self.data_fields));
        if let Some(filters) = &self.filter_fields {
            p.insert("filter_fields".into(), string_list(filters));
        }
        let mut map = JsonMap::new();
        map.insert("pivot".into(), Value::Object(p));
        map
    }
}

/// A cell comment (legacy note or threaded).
#[derive(Clone, Debug, Default)]
pub struct CommentSpec {
    pub cell: String,
    pub text: String,
    pub author: Option<String>,
    pub threaded: Option<bool>,
}

impl CommentSpec {
    pub fn from_expected(expected: &JsonMap) -> Option<Self> {
        let c = expected.get("comment").and_then(Value::as_object)?;
        Some(Self {
            cell: get_str(c, "cell")?,
            text: get_str(c, "text")?,
            author: get_str(c, "author"),
            threaded: get_bool(c, "threaded"),
        })
    }

    pub fn to_expected(&self) -> JsonMap {
        let mut c = JsonMap::new();
        c.insert("cell".into(), Value::String(self.cell.clone()));
        c.insert("text".into(), Value::String(self.text.clone()));
        put_str(&mut c, "author", &self.author);
        put_bool(&mut c, "threaded", self.threaded);
        let mut map = JsonMap::new();
        map.insert("comment".into(), Value::Object(c));
        map
    }
}

/// Frozen or split panes on a sheet.
#[derive(Clone, Debug, Default)]
pub struct FreezePaneSpec {
    pub mode: String,
    pub top_left_cell: Option<String>,
    pub x_split: Option<i64>,
    pub y_split: Option<i64>,
    pub active_pane: Option<String>,
}

impl FreezePaneSpec {
    pub fn from_expected(expected: &JsonMap) -> Option<Self> {
        let f = expected.get("freeze").and_then(Value::as_object)?;
        Some(Self {
            mode: get_str(f, "mode")?,
            top_left_cell: get_str(f, "top_left_cell"),
            x_split: get_int(f, "x_split"),
            y_split: get_int(f, "y_split"),
            active_pane: get_str(f, "active_pane"),
        })
    }

    pub fn to_expected(&self) -> JsonMap {
        let mut f = JsonMap::new();
        f.insert("mode".into(), Value::String(self.mode.clone()));
        put_str(&mut f, "top_left_cell", &self.top_left_cell);
        put_int(&mut f, "x_split", self.x_split);
        put_int(&mut f, "y_split", self.y_split);
        put_str(&mut f, "active_pane", &self.active_pane);
        let mut map = JsonMap::new();
        map.insert("freeze".into(), Value::Object(f));
        map
    }
}
