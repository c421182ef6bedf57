//! Pure canonicalization helpers applied to both expected and actual payloads
//! before comparison: formula text, number-format codes, sheet-qualified
//! references, range anchors, and fixture sheet-name discovery.

use serde_json::Value;

use crate::models::TestFile;

/// Canonicalize formula text: trim, strip a single leading `=`, then strip one
/// layer of surrounding double quotes.
///
/// Quote stripping is deliberately single-layer: doubly-wrapped text like
/// `=""SUM(A1)""` is not unwrapped twice. Known limitation, kept for parity
/// with historical behavior.
pub fn normalize_formula(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(stripped) = s.strip_prefix('=') {
        s = stripped.trim();
    }
    if s.len() >= 2 {
        if let Some(inner) = s.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            s = inner;
        }
    }
    s.trim().to_string()
}

/// [`normalize_formula`] lifted to JSON values; non-strings pass through.
pub fn normalize_formula_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize_formula(s)),
        other => other.clone(),
    }
}

/// Canonicalize a number-format code: drop backslash escapes (`\-` becomes
/// `-`) and unwrap single-character quoted literals (`"$"` becomes `$`).
/// Multi-character quoted literals are left intact.
pub fn normalize_number_format(fmt: &str) -> String {
    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => {
                let mut literal = String::new();
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                    literal.push(q);
                }
                if literal.chars().count() == 1 {
                    out.push_str(&literal);
                } else {
                    out.push('"');
                    out.push_str(&literal);
                    out.push('"');
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Strip `$` anchors from a range ("$A$1:$A$5" -> "A1:A5").
pub fn normalize_range(range: &str) -> String {
    range.chars().filter(|c| *c != '$').collect()
}

fn is_sheet_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Rewrite unquoted sheet references to single-quoted form:
/// `=References!B2` becomes `='References'!B2`. Already-quoted references and
/// formulas without sheet references pass through unchanged.
pub fn normalize_sheet_quotes(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len() + 2);
    let mut word_start: Option<usize> = None;
    let mut chars = formula.chars();

    while let Some(c) = chars.next() {
        if c == '\'' {
            out.push(c);
            for q in chars.by_ref() {
                out.push(q);
                if q == '\'' {
                    break;
                }
            }
            word_start = None;
        } else if c == '!' {
            if let Some(start) = word_start {
                let starts_alpha = out
                    .get(start..)
                    .and_then(|w| w.chars().next())
                    .is_some_and(char::is_alphabetic);
                if starts_alpha {
                    out.insert(start, '\'');
                    out.push('\'');
                }
            }
            out.push('!');
            word_start = None;
        } else if is_sheet_name_char(c) {
            if word_start.is_none() {
                word_start = Some(out.len());
            }
            out.push(c);
        } else {
            out.push(c);
            word_start = None;
        }
    }
    out
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Collect all sheet names referenced by a formula (quoted or unquoted),
/// unique, in first-occurrence order.
pub fn extract_formula_sheet_names(formula: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut word = String::new();
    let mut chars = formula.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            let mut quoted = String::new();
            let mut closed = false;
            for q in chars.by_ref() {
                if q == '\'' {
                    closed = true;
                    break;
                }
                quoted.push(q);
            }
            if closed && chars.peek() == Some(&'!') && !quoted.is_empty() {
                push_unique(&mut names, quoted);
            }
            word.clear();
        } else if c == '!' {
            let starts_alpha = word.chars().next().is_some_and(char::is_alphabetic);
            if starts_alpha {
                push_unique(&mut names, word.clone());
            }
            word.clear();
        } else if is_sheet_name_char(c) {
            word.push(c);
        } else {
            word.clear();
        }
    }
    names
}

fn formulas_in_expected(expected: &crate::models::JsonMap) -> Vec<&str> {
    let mut formulas = Vec::new();
    if let Some(f) = expected.get("formula").and_then(Value::as_str) {
        formulas.push(f);
    }
    if let Some(rule) = expected.get("cf_rule").and_then(Value::as_object) {
        if let Some(f) = rule.get("formula").and_then(Value::as_str) {
            formulas.push(f);
        }
    }
    if let Some(v) = expected.get("validation").and_then(Value::as_object) {
        for key in ["formula1", "formula2"] {
            if let Some(f) = v.get(key).and_then(Value::as_str) {
                formulas.push(f);
            }
        }
    }
    formulas
}

/// The sheet names a fixture file needs: the feature sheet first, then any
/// sheets referenced by case formulas, validations, or conditional formats.
/// An explicit `sheet_names` expectation replaces the list wholesale.
pub fn collect_sheet_names(test_file: &TestFile) -> Vec<String> {
    let mut sheets = vec![test_file.feature.clone()];

    for tc in &test_file.test_cases {
        if let Some(names) = tc.expected.get("sheet_names").and_then(Value::as_array) {
            sheets = names
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect();
        }
        if let Some(sheet) = &tc.sheet {
            push_unique(&mut sheets, sheet.clone());
        }
        for formula in formulas_in_expected(&tc.expected) {
            for name in extract_formula_sheet_names(formula) {
                push_unique(&mut sheets, name);
            }
        }
    }

    sheets
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::{Importance, TestCase};
    use serde_json::json;
    use test_case::test_case;

    fn tc(expected: Value, sheet: Option<&str>) -> TestCase {
        let Value::Object(expected) = expected else {
            panic!("expected must be an object");
        };
        TestCase {
            id: "t1".into(),
            label: "t1".into(),
            row: 2,
            expected,
            importance: Importance::Basic,
            sheet: sheet.map(String::from),
        }
    }

    fn tf(feature: &str, cases: Vec<TestCase>) -> TestFile {
        TestFile {
            path: "a.xlsx".into(),
            feature: feature.into(),
            tier: 1,
            test_cases: cases,
        }
    }

    #[test_case("=1+1", "1+1"; "strip equals")]
    #[test_case("\"hello\"", "hello"; "strip quotes")]
    #[test_case("=\"SUM(A1)\"", "SUM(A1)"; "strip both")]
    #[test_case("SUM(A1:A5)", "SUM(A1:A5)"; "plain text")]
    #[test_case("  =1+1  ", "1+1"; "whitespace")]
    fn formula_normalization(input: &str, want: &str) {
        assert_eq!(normalize_formula(input), want);
    }

    #[test]
    fn formula_quote_stripping_is_single_layer() {
        // Known limitation: double-wrapped text loses only one quote layer.
        assert_eq!(normalize_formula("=\"\"SUM(A1)\"\""), "\"SUM(A1)\"");
    }

    #[test]
    fn formula_value_passthrough_for_non_strings() {
        assert_eq!(normalize_formula_value(&json!(42)), json!(42));
        assert_eq!(normalize_formula_value(&Value::Null), Value::Null);
    }

    #[test_case("yyyy\\-mm\\-dd", "yyyy-mm-dd"; "backslash escapes")]
    #[test_case("\"$\"#,##0.00", "$#,##0.00"; "single char quotes")]
    #[test_case("#,##0.00", "#,##0.00"; "no change")]
    #[test_case("0\\ %", "0 %"; "backslash space")]
    #[test_case("\"$\"#,##0\\-00", "$#,##0-00"; "mixed")]
    #[test_case("\"USD\" 0.00", "\"USD\" 0.00"; "multi char literal kept")]
    fn number_format_normalization(input: &str, want: &str) {
        assert_eq!(normalize_number_format(input), want);
    }

    #[test_case("=References!B2", "='References'!B2"; "unquoted")]
    #[test_case("='References'!B2", "='References'!B2"; "already quoted")]
    #[test_case("=SUM(A1:A5)", "=SUM(A1:A5)"; "no sheet ref")]
    #[test_case("=Data!$A$1", "='Data'!$A$1"; "dollar signs")]
    fn sheet_quoting(input: &str, want: &str) {
        assert_eq!(normalize_sheet_quotes(input), want);
    }

    #[test]
    fn extract_sheet_names_variants() {
        assert!(extract_formula_sheet_names("").is_empty());
        assert_eq!(extract_formula_sheet_names("='My Sheet'!A1"), ["My Sheet"]);
        assert_eq!(extract_formula_sheet_names("=Data!A1"), ["Data"]);
        assert_eq!(
            extract_formula_sheet_names("='Sheet1'!A1+Data!B2"),
            ["Sheet1", "Data"]
        );
        // Quoted and unquoted references to the same sheet deduplicate.
        assert_eq!(extract_formula_sheet_names("='Data'!A1+Data!B2"), ["Data"]);
    }

    #[test]
    fn range_normalization() {
        assert_eq!(normalize_range("$A$1:$A$5"), "A1:A5");
        assert_eq!(normalize_range("A1:A5"), "A1:A5");
    }

    #[test]
    fn collect_sheets_empty_cases() {
        assert_eq!(collect_sheet_names(&tf("cell_values", vec![])), ["cell_values"]);
    }

    #[test]
    fn collect_sheets_explicit_names_replace_list() {
        let file = tf(
            "multiple_sheets",
            vec![tc(json!({"sheet_names": ["Sheet1", "Sheet2"]}), None)],
        );
        assert_eq!(collect_sheet_names(&file), ["Sheet1", "Sheet2"]);
    }

    #[test]
    fn collect_sheets_from_formulas() {
        let file = tf("formulas", vec![tc(json!({"formula": "='Data'!A1"}), None)]);
        let sheets = collect_sheet_names(&file);
        assert_eq!(sheets.first().map(String::as_str), Some("formulas"));
        assert!(sheets.iter().any(|s| s == "Data"));
    }

    #[test]
    fn collect_sheets_from_cf_and_validation() {
        let file = tf(
            "conditional_formatting",
            vec![
                tc(json!({"cf_rule": {"formula": "='Ref'!A1>0"}}), None),
                tc(json!({"validation": {"formula1": "='Lists'!A1:A5"}}), None),
            ],
        );
        let sheets = collect_sheet_names(&file);
        assert!(sheets.iter().any(|s| s == "Ref"));
        assert!(sheets.iter().any(|s| s == "Lists"));
    }

    #[test]
    fn collect_sheets_includes_explicit_case_sheet() {
        let file = tf(
            "cell_values",
            vec![tc(json!({"type": "string"}), Some("Custom"))],
        );
        let sheets = collect_sheet_names(&file);
        assert!(sheets.iter().any(|s| s == "Custom"));
        assert!(sheets.iter().any(|s| s == "cell_values"));
    }
}
