//! Core data model: test cases, results, adapter metadata, and the typed
//! reconstructions (`CellValue`, `CellFormat`, `BorderInfo`) the comparator
//! works with.
//!
//! Expected/actual payloads stay `serde_json` maps — that is the wire format
//! shared with generators and reports. The typed structs here are built fresh
//! per comparison from those maps and discarded immediately after.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object in the expected-value wire format.
pub type JsonMap = Map<String, Value>;

/// The type of a spreadsheet cell value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    #[default]
    Blank,
    String,
    Number,
    Boolean,
    Date,
    Datetime,
    Error,
    Formula,
}

impl CellType {
    /// Wire-format name ("string", "datetime", ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Error => "error",
            Self::Formula => "formula",
        }
    }

    /// Parse a wire-format name; unknown names fall back to `String`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "blank" => Self::Blank,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::Datetime,
            "error" => Self::Error,
            "formula" => Self::Formula,
            _ => Self::String,
        }
    }
}

/// A typed scalar held by a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellScalar {
    Bool(bool),
    Number(f64),
    /// Strings, error literals, and canonical ISO-8601 date/datetime text.
    Text(String),
}

impl CellScalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// A single cell's value as seen by an adapter or an expectation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellValue {
    #[serde(rename = "type")]
    pub cell_type: CellType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CellScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl CellValue {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::String,
            value: Some(CellScalar::Text(value.into())),
            formula: None,
        }
    }

    pub fn number(value: f64) -> Self {
        Self {
            cell_type: CellType::Number,
            value: Some(CellScalar::Number(value)),
            formula: None,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            cell_type: CellType::Boolean,
            value: Some(CellScalar::Bool(value)),
            formula: None,
        }
    }

    /// Convert to the wire-format map used in expected/actual payloads.
    ///
    /// Blank cells serialize with no `value` key at all.
    pub fn to_wire(&self) -> JsonMap {
        let mut map = JsonMap::new();
        map.insert("type".into(), Value::String(self.cell_type.as_str().into()));
        if let Some(value) = &self.value {
            let v = match value {
                CellScalar::Bool(b) => Value::Bool(*b),
                CellScalar::Number(n) => serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                CellScalar::Text(s) => Value::String(s.clone()),
            };
            map.insert("value".into(), v);
        }
        if let Some(formula) = &self.formula {
            map.insert("formula".into(), Value::String(formula.clone()));
        }
        map
    }
}

/// Font, fill, alignment, and number-format attributes of a cell.
///
/// Every field is optional; `None` means "don't care" and is never folded
/// into a false-y default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellFormat {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub font_color: Option<String>,
    pub bg_color: Option<String>,
    pub number_format: Option<String>,
    pub h_align: Option<String>,
    pub v_align: Option<String>,
    pub wrap: Option<bool>,
    pub rotation: Option<i32>,
    pub indent: Option<u32>,
}

impl CellFormat {
    /// Convert to a wire-format map containing only the set fields.
    pub fn to_wire(&self) -> JsonMap {
        let mut map = JsonMap::new();
        let mut put = |key: &str, v: Option<Value>| {
            if let Some(v) = v {
                map.insert(key.into(), v);
            }
        };
        put("bold", self.bold.map(Value::Bool));
        put("italic", self.italic.map(Value::Bool));
        put("underline", self.underline.map(Value::Bool));
        put("strikethrough", self.strikethrough.map(Value::Bool));
        put("font_name", self.font_name.clone().map(Value::String));
        put(
            "font_size",
            self.font_size
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
        );
        put("font_color", self.font_color.clone().map(Value::String));
        put("bg_color", self.bg_color.clone().map(Value::String));
        put(
            "number_format",
            self.number_format.clone().map(Value::String),
        );
        put("h_align", self.h_align.clone().map(Value::String));
        put("v_align", self.v_align.clone().map(Value::String));
        put("wrap", self.wrap.map(Value::Bool));
        put("rotation", self.rotation.map(|r| Value::Number(r.into())));
        put("indent", self.indent.map(|i| Value::Number(i.into())));
        map
    }
}

/// Border line style names as they appear in OOXML and the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thin => "thin",
            Self::Medium => "medium",
            Self::Thick => "thick",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
            Self::Double => "double",
            Self::Hair => "hair",
            Self::MediumDashed => "mediumDashed",
            Self::DashDot => "dashDot",
            Self::MediumDashDot => "mediumDashDot",
            Self::DashDotDot => "dashDotDot",
            Self::MediumDashDotDot => "mediumDashDotDot",
            Self::SlantDashDot => "slantDashDot",
        }
    }

    /// Parse a style name; unknown names default to `Thin`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "medium" => Self::Medium,
            "thick" => Self::Thick,
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            "double" => Self::Double,
            "hair" => Self::Hair,
            "mediumDashed" => Self::MediumDashed,
            "dashDot" => Self::DashDot,
            "mediumDashDot" => Self::MediumDashDot,
            "dashDotDot" => Self::DashDotDot,
            "mediumDashDotDot" => Self::MediumDashDotDot,
            "slantDashDot" => Self::SlantDashDot,
            _ => Self::Thin,
        }
    }
}

/// One edge of a cell border.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderEdge {
    pub style: BorderStyle,
    /// `#RRGGBB`.
    pub color: String,
}

/// Four-edge-plus-diagonal border styling; unset edges are "don't care".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderInfo {
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub diagonal_up: Option<BorderEdge>,
    pub diagonal_down: Option<BorderEdge>,
}

impl BorderInfo {
    /// Convert to wire-format keys (`border_top`, `border_top_color`, ...).
    pub fn to_wire(&self) -> JsonMap {
        let mut map = JsonMap::new();
        let mut put = |name: &str, edge: &Option<BorderEdge>| {
            if let Some(edge) = edge {
                map.insert(
                    format!("border_{name}"),
                    Value::String(edge.style.as_str().into()),
                );
                map.insert(
                    format!("border_{name}_color"),
                    Value::String(edge.color.clone()),
                );
            }
        };
        put("top", &self.top);
        put("bottom", &self.bottom);
        put("left", &self.left);
        put("right", &self.right);
        put("diagonal_up", &self.diagonal_up);
        put("diagonal_down", &self.diagonal_down);
        map
    }
}

/// Two-tier test-case severity. BASIC failures can zero out a feature's
/// score; EDGE failures only cap it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Basic,
    Edge,
}

/// Which half of the contract a result exercised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Write,
}

/// A single feature test case authored by a fixture generator.
///
/// The value cell lives in column B of `row`; the expectation is an
/// arbitrary wire-format map whose shape the relevant `read_*_actual`
/// function and the comparator understand.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub label: String,
    pub row: u32,
    pub expected: JsonMap,
    pub importance: Importance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl TestCase {
    /// The A1-style reference of this case's value cell.
    pub fn cell_ref(&self) -> String {
        format!("B{}", self.row)
    }
}

/// A generated fixture file and its test cases.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestFile {
    pub path: String,
    pub feature: String,
    pub tier: u8,
    pub test_cases: Vec<TestCase>,
}

/// Outcome of one (test case x operation x adapter) run. Never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub test_case_id: String,
    pub operation: Operation,
    pub passed: bool,
    pub expected: JsonMap,
    pub actual: JsonMap,
    pub importance: Importance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Read/write capability flags declared by an adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    Write,
}

/// Static per-adapter metadata, created once at adapter construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
    pub language: String,
    pub capabilities: BTreeSet<Capability>,
}

impl LibraryInfo {
    pub fn can_read(&self) -> bool {
        self.capabilities.contains(&Capability::Read)
    }

    pub fn can_write(&self) -> bool {
        self.capabilities.contains(&Capability::Write)
    }
}

/// Aggregate conformance score for one (feature x library) pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature: String,
    pub library: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_score: Option<u8>,
    pub test_results: Vec<TestResult>,
}
