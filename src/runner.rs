//! Executes test cases against adapters and produces per-case results.
//!
//! Read flow: open the fixture, read the feature-relevant state for each
//! case, normalize both sides, compare. Write flow: create a fresh workbook,
//! translate each expectation into write calls, save, then read the file
//! back with the selected verifier. A comparison can fail but never raise;
//! workbook handles are closed on every exit path.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde_json::Value;

use crate::adapter::{SpreadsheetAdapter, Workbook};
use crate::cell_ref::{column_letters, format_cell_ref, parse_cell_range};
use crate::compare::compare_results;
use crate::convert::{border_from_expected, cell_format_from_expected, cell_value_from_expected};
use crate::error::{BenchError, Result};
use crate::matcher::{find_rule, find_validation, project_rule, strip_cf_priority};
use crate::models::{
    CellFormat, FeatureScore, JsonMap, Operation, TestCase, TestFile, TestResult,
};
use crate::normalize::{
    collect_sheet_names, normalize_formula, normalize_number_format, normalize_range,
    normalize_sheet_quotes,
};
use crate::score::calculate_score;
use crate::specs::{
    CommentSpec, ConditionalFormatSpec, DataValidationSpec, FreezePaneSpec, HyperlinkSpec,
    ImageSpec, MergeSpec, PivotSpec,
};

/// Every benchmarked feature. Tier 1 covers core cell content and layout;
/// tier 2 covers structured sheet artifacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    CellValues,
    Formulas,
    TextFormatting,
    BackgroundColors,
    NumberFormats,
    Alignment,
    Borders,
    Dimensions,
    MultipleSheets,
    MergedCells,
    ConditionalFormatting,
    DataValidation,
    Hyperlinks,
    Images,
    PivotTables,
    Comments,
    FreezePanes,
}

impl Feature {
    pub const ALL: [Self; 17] = [
        Self::CellValues,
        Self::Formulas,
        Self::TextFormatting,
        Self::BackgroundColors,
        Self::NumberFormats,
        Self::Alignment,
        Self::Borders,
        Self::Dimensions,
        Self::MultipleSheets,
        Self::MergedCells,
        Self::ConditionalFormatting,
        Self::DataValidation,
        Self::Hyperlinks,
        Self::Images,
        Self::PivotTables,
        Self::Comments,
        Self::FreezePanes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CellValues => "cell_values",
            Self::Formulas => "formulas",
            Self::TextFormatting => "text_formatting",
            Self::BackgroundColors => "background_colors",
            Self::NumberFormats => "number_formats",
            Self::Alignment => "alignment",
            Self::Borders => "borders",
            Self::Dimensions => "dimensions",
            Self::MultipleSheets => "multiple_sheets",
            Self::MergedCells => "merged_cells",
            Self::ConditionalFormatting => "conditional_formatting",
            Self::DataValidation => "data_validation",
            Self::Hyperlinks => "hyperlinks",
            Self::Images => "images",
            Self::PivotTables => "pivot_tables",
            Self::Comments => "comments",
            Self::FreezePanes => "freeze_panes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn tier(self) -> u8 {
        match self {
            Self::CellValues
            | Self::Formulas
            | Self::TextFormatting
            | Self::BackgroundColors
            | Self::NumberFormats
            | Self::Alignment
            | Self::Borders
            | Self::Dimensions
            | Self::MultipleSheets => 1,
            _ => 2,
        }
    }
}

fn canonical_formula(raw: &str) -> String {
    normalize_sheet_quotes(&normalize_formula(raw))
}

fn normalize_key(map: &mut JsonMap, key: &str, f: impl Fn(&str) -> String) {
    if let Some(Value::String(s)) = map.get(key) {
        let canon = f(s);
        map.insert(key.into(), Value::String(canon));
    }
}

/// Canonicalize the comparison-sensitive keys of a payload, top level and
/// nested (`cf_rule`, `validation`). Applied identically to expected and
/// actual maps so both sides meet on the same form.
pub fn normalize_payload(payload: &JsonMap) -> JsonMap {
    let mut map = payload.clone();
    normalize_key(&mut map, "formula", canonical_formula);
    normalize_key(&mut map, "number_format", normalize_number_format);
    normalize_key(&mut map, "merged_range", normalize_range);

    if let Some(Value::Object(rule)) = map.get_mut("cf_rule") {
        normalize_key(rule, "formula", canonical_formula);
        normalize_key(rule, "range", normalize_range);
    }
    if let Some(Value::Object(v)) = map.get_mut("validation") {
        normalize_key(v, "formula1", canonical_formula);
        normalize_key(v, "formula2", canonical_formula);
        normalize_key(v, "range", normalize_range);
    }
    map
}

fn expected_inner<'a>(tc: &'a TestCase, key: &str) -> Option<&'a JsonMap> {
    tc.expected.get(key).and_then(Value::as_object)
}

fn inner_cell_or_default(inner: Option<&JsonMap>, tc: &TestCase) -> String {
    inner
        .and_then(|m| m.get("cell").and_then(Value::as_str))
        .map_or_else(|| tc.cell_ref(), String::from)
}

fn wrap(key: &str, inner: JsonMap) -> JsonMap {
    let mut map = JsonMap::new();
    map.insert(key.into(), Value::Object(inner));
    map
}

fn scalar_json(book: &dyn Workbook, sheet: &str, cell: &str) -> Result<Option<Value>> {
    let mut wire = book.read_cell(sheet, cell)?.to_wire();
    Ok(wire.remove("value"))
}

fn value_and_format(book: &dyn Workbook, sheet: &str, cell: &str) -> Result<JsonMap> {
    let mut map = book.read_cell(sheet, cell)?.to_wire();
    for (key, value) in book.read_format(sheet, cell)?.to_wire() {
        map.insert(key, value);
    }
    Ok(map)
}

fn dimensions_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let mut map = JsonMap::new();
    if tc.expected.contains_key("row_height") {
        if let Some(height) = book.row_height(sheet, tc.row)? {
            if let Some(n) = serde_json::Number::from_f64(height) {
                map.insert("row_height".into(), Value::Number(n));
            }
        }
    }
    if tc.expected.contains_key("column_width") {
        let column = tc
            .expected
            .get("column")
            .and_then(Value::as_str)
            .map_or_else(|| column_letters(&tc.cell_ref()), String::from);
        if let Some(width) = book.column_width(sheet, &column)? {
            map.insert("column".into(), Value::String(column));
            if let Some(n) = serde_json::Number::from_f64(width) {
                map.insert("column_width".into(), Value::Number(n));
            }
        }
    }
    Ok(map)
}

fn range_cells(range: &str) -> Vec<(u32, u32)> {
    let Some((start_row, start_col, end_row, end_col)) = parse_cell_range(range) else {
        return Vec::new();
    };
    let mut cells = Vec::new();
    for row in start_row..=end_row {
        for col in start_col..=end_col {
            cells.push((col, row));
        }
    }
    cells
}

fn merged_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let mut map = JsonMap::new();
    let Some(want) = tc.expected.get("merged_range").and_then(Value::as_str) else {
        return Ok(map);
    };
    let want_norm = normalize_range(want);
    let ranges = book.merged_ranges(sheet)?;
    let Some(found) = ranges.iter().find(|r| normalize_range(r) == want_norm) else {
        return Ok(map);
    };
    map.insert("merged_range".into(), Value::String(normalize_range(found)));

    let cells = range_cells(found);
    let top_left = cells.first().copied();
    let rest = cells.get(1..).unwrap_or_default();

    if let Some((col, row)) = top_left {
        let cell = format_cell_ref(col, row);
        if tc.expected.contains_key("top_left_value") {
            if let Some(value) = scalar_json(book, sheet, &cell)? {
                map.insert("top_left_value".into(), value);
            }
        }
        if tc.expected.contains_key("top_left_bg_color") {
            if let Some(bg) = book.read_format(sheet, &cell)?.bg_color {
                map.insert("top_left_bg_color".into(), Value::String(bg));
            }
        }
    }
    if tc.expected.contains_key("non_top_left_nonempty") {
        let mut nonempty: i64 = 0;
        for (col, row) in rest {
            let cell = format_cell_ref(*col, *row);
            if book.read_cell(sheet, &cell)?.value.is_some() {
                nonempty += 1;
            }
        }
        map.insert("non_top_left_nonempty".into(), Value::Number(nonempty.into()));
    }
    if tc.expected.contains_key("non_top_left_bg_color") {
        if let Some((col, row)) = rest.first() {
            let cell = format_cell_ref(*col, *row);
            if let Some(bg) = book.read_format(sheet, &cell)?.bg_color {
                map.insert("non_top_left_bg_color".into(), Value::String(bg));
            }
        }
    }
    Ok(map)
}

fn cf_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let Some(expected_rule) = expected_inner(tc, "cf_rule") else {
        return Ok(JsonMap::new());
    };
    let rules = book.conditional_formats(sheet)?;
    Ok(match find_rule(&rules, expected_rule) {
        Some(rule) => wrap("cf_rule", project_rule(rule, expected_rule)),
        None => JsonMap::new(),
    })
}

fn validation_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let Some(expected_v) = expected_inner(tc, "validation") else {
        return Ok(JsonMap::new());
    };
    let validations = book.data_validations(sheet)?;
    Ok(match find_validation(&validations, expected_v) {
        Some(v) => wrap("validation", project_rule(v, expected_v)),
        None => JsonMap::new(),
    })
}

fn hyperlink_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let expected_h = expected_inner(tc, "hyperlink");
    let cell = inner_cell_or_default(expected_h, tc);
    Ok(match (book.hyperlink(sheet, &cell)?, expected_h) {
        (Some(link), Some(expected)) => wrap("hyperlink", project_rule(&link, expected)),
        (Some(link), None) => wrap("hyperlink", link),
        (None, _) => JsonMap::new(),
    })
}

fn find_by_key<'a>(items: &'a [JsonMap], key: &str, want: &str) -> Option<&'a JsonMap> {
    items
        .iter()
        .find(|item| item.get(key).and_then(Value::as_str) == Some(want))
}

fn images_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let Some(expected_img) = expected_inner(tc, "image") else {
        return Ok(JsonMap::new());
    };
    let images = book.images(sheet)?;
    let found = expected_img
        .get("cell")
        .and_then(Value::as_str)
        .and_then(|cell| find_by_key(&images, "cell", cell))
        .or_else(|| images.first());
    Ok(match found {
        Some(img) => wrap("image", project_rule(img, expected_img)),
        None => JsonMap::new(),
    })
}

fn pivots_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let Some(expected_p) = expected_inner(tc, "pivot") else {
        return Ok(JsonMap::new());
    };
    let pivots = book.pivot_tables(sheet)?;
    let found = expected_p
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| find_by_key(&pivots, "name", name))
        .or_else(|| pivots.first());
    Ok(match found {
        Some(p) => wrap("pivot", project_rule(p, expected_p)),
        None => JsonMap::new(),
    })
}

fn comment_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let expected_c = expected_inner(tc, "comment");
    let cell = inner_cell_or_default(expected_c, tc);
    Ok(match (book.comment(sheet, &cell)?, expected_c) {
        (Some(comment), Some(expected)) => wrap("comment", project_rule(&comment, expected)),
        (Some(comment), None) => wrap("comment", comment),
        (None, _) => JsonMap::new(),
    })
}

fn freeze_actual(book: &dyn Workbook, sheet: &str, tc: &TestCase) -> Result<JsonMap> {
    let Some(expected_f) = expected_inner(tc, "freeze") else {
        return Ok(JsonMap::new());
    };
    Ok(match book.freeze_panes(sheet)? {
        Some(freeze) => wrap("freeze", project_rule(&freeze, expected_f)),
        None => JsonMap::new(),
    })
}

/// Read the feature-relevant state for one case, shaped like its expectation.
pub fn read_actual(
    book: &dyn Workbook,
    feature: Feature,
    sheet: &str,
    tc: &TestCase,
) -> Result<JsonMap> {
    match feature {
        Feature::CellValues | Feature::Formulas => {
            Ok(book.read_cell(sheet, &tc.cell_ref())?.to_wire())
        }
        Feature::TextFormatting
        | Feature::BackgroundColors
        | Feature::NumberFormats
        | Feature::Alignment => value_and_format(book, sheet, &tc.cell_ref()),
        Feature::Borders => {
            let mut map = book.read_cell(sheet, &tc.cell_ref())?.to_wire();
            for (key, value) in book.read_border(sheet, &tc.cell_ref())?.to_wire() {
                map.insert(key, value);
            }
            Ok(map)
        }
        Feature::Dimensions => dimensions_actual(book, sheet, tc),
        Feature::MultipleSheets => {
            let names = book.sheet_names()?;
            let mut map = JsonMap::new();
            map.insert(
                "sheet_names".into(),
                Value::Array(names.into_iter().map(Value::String).collect()),
            );
            Ok(map)
        }
        Feature::MergedCells => merged_actual(book, sheet, tc),
        Feature::ConditionalFormatting => cf_actual(book, sheet, tc),
        Feature::DataValidation => validation_actual(book, sheet, tc),
        Feature::Hyperlinks => hyperlink_actual(book, sheet, tc),
        Feature::Images => images_actual(book, sheet, tc),
        Feature::PivotTables => pivots_actual(book, sheet, tc),
        Feature::Comments => comment_actual(book, sheet, tc),
        Feature::FreezePanes => freeze_actual(book, sheet, tc),
    }
}

fn missing_spec(tc: &TestCase, key: &str) -> BenchError {
    BenchError::Other(format!("case {} lacks a usable '{key}' expectation", tc.id))
}

fn write_value_if_present(
    book: &mut dyn Workbook,
    sheet: &str,
    cell: &str,
    tc: &TestCase,
) -> Result<()> {
    if tc.expected.contains_key("value") || tc.expected.contains_key("formula") {
        book.write_cell(sheet, cell, &cell_value_from_expected(&tc.expected))?;
    }
    Ok(())
}

fn write_merge(book: &mut dyn Workbook, sheet: &str, tc: &TestCase) -> Result<()> {
    let spec = MergeSpec::from_expected(&tc.expected).ok_or_else(|| missing_spec(tc, "merged_range"))?;
    book.merge_cells(sheet, &spec.range)?;

    let cells = range_cells(&spec.range);
    let Some((col, row)) = cells.first().copied() else {
        return Err(BenchError::CellRef(spec.range));
    };
    let top_left = format_cell_ref(col, row);
    if let Some(value) = &spec.top_left_value {
        book.write_cell(sheet, &top_left, &crate::models::CellValue::string(value.clone()))?;
    }
    if let Some(bg) = &spec.top_left_bg_color {
        let format = CellFormat {
            bg_color: Some(bg.clone()),
            ..CellFormat::default()
        };
        book.write_format(sheet, &top_left, &format)?;
    }
    if let Some(bg) = &spec.non_top_left_bg_color {
        let format = CellFormat {
            bg_color: Some(bg.clone()),
            ..CellFormat::default()
        };
        for (col, row) in cells.get(1..).unwrap_or_default() {
            book.write_format(sheet, &format_cell_ref(*col, *row), &format)?;
        }
    }
    Ok(())
}

fn write_dimensions(book: &mut dyn Workbook, sheet: &str, tc: &TestCase) -> Result<()> {
    if let Some(height) = tc.expected.get("row_height").and_then(Value::as_f64) {
        book.set_row_height(sheet, tc.row, height)?;
    }
    if let Some(width) = tc.expected.get("column_width").and_then(Value::as_f64) {
        let column = tc
            .expected
            .get("column")
            .and_then(Value::as_str)
            .map_or_else(|| column_letters(&tc.cell_ref()), String::from);
        book.set_column_width(sheet, &column, width)?;
    }
    Ok(())
}

/// Translate one expectation into adapter write calls.
pub fn write_case(
    book: &mut dyn Workbook,
    feature: Feature,
    sheet: &str,
    tc: &TestCase,
) -> Result<()> {
    let cell = tc.cell_ref();
    match feature {
        Feature::CellValues | Feature::Formulas => {
            book.write_cell(sheet, &cell, &cell_value_from_expected(&tc.expected))
        }
        Feature::TextFormatting
        | Feature::BackgroundColors
        | Feature::NumberFormats
        | Feature::Alignment => {
            write_value_if_present(book, sheet, &cell, tc)?;
            book.write_format(sheet, &cell, &cell_format_from_expected(&tc.expected))
        }
        Feature::Borders => {
            write_value_if_present(book, sheet, &cell, tc)?;
            book.write_border(sheet, &cell, &border_from_expected(&tc.expected))
        }
        Feature::Dimensions => write_dimensions(book, sheet, tc),
        Feature::MultipleSheets => write_value_if_present(book, sheet, &cell, tc),
        Feature::MergedCells => write_merge(book, sheet, tc),
        Feature::ConditionalFormatting => {
            let spec = ConditionalFormatSpec::from_expected(&tc.expected)
                .ok_or_else(|| missing_spec(tc, "cf_rule"))?;
            book.add_conditional_format(sheet, &spec)
        }
        Feature::DataValidation => {
            let spec = DataValidationSpec::from_expected(&tc.expected)
                .ok_or_else(|| missing_spec(tc, "validation"))?;
            book.add_data_validation(sheet, &spec)
        }
        Feature::Hyperlinks => {
            let spec = HyperlinkSpec::from_expected(&tc.expected)
                .ok_or_else(|| missing_spec(tc, "hyperlink"))?;
            book.add_hyperlink(sheet, &spec)
        }
        Feature::Images => {
            let spec = ImageSpec::from_expected(&tc.expected)
                .ok_or_else(|| missing_spec(tc, "image"))?;
            book.add_image(sheet, &spec)
        }
        Feature::PivotTables => {
            let spec = PivotSpec::from_expected(&tc.expected)
                .ok_or_else(|| missing_spec(tc, "pivot"))?;
            book.add_pivot_table(sheet, &spec)
        }
        Feature::Comments => {
            let spec = CommentSpec::from_expected(&tc.expected)
                .ok_or_else(|| missing_spec(tc, "comment"))?;
            book.add_comment(sheet, &spec)
        }
        Feature::FreezePanes => {
            let spec = FreezePaneSpec::from_expected(&tc.expected)
                .ok_or_else(|| missing_spec(tc, "freeze"))?;
            book.set_freeze_panes(sheet, &spec)
        }
    }
}

fn case_sheet(tc: &TestCase, test_file: &TestFile) -> String {
    tc.sheet.clone().unwrap_or_else(|| test_file.feature.clone())
}

/// Run one read case: read, normalize both sides, compare.
pub fn run_read_case(
    book: &dyn Workbook,
    feature: Feature,
    sheet: &str,
    tc: &TestCase,
) -> TestResult {
    build_case_result(book, feature, sheet, tc, Operation::Read)
}

fn build_case_result(
    book: &dyn Workbook,
    feature: Feature,
    sheet: &str,
    tc: &TestCase,
    operation: Operation,
) -> TestResult {
    let expected = normalize_payload(&strip_cf_priority(&tc.expected));
    let (actual, notes) = match read_actual(book, feature, sheet, tc) {
        Ok(actual) => (normalize_payload(&actual), None),
        Err(err) => {
            warn!("case {}: read failed: {err}", tc.id);
            (JsonMap::new(), Some(err.to_string()))
        }
    };
    let passed = compare_results(&expected, &actual);
    TestResult {
        test_case_id: tc.id.clone(),
        operation,
        passed,
        expected,
        actual,
        importance: tc.importance,
        notes,
        label: Some(tc.label.clone()),
    }
}

/// Run every case of a fixture file against a reading adapter.
pub fn run_read_file(
    adapter: &dyn SpreadsheetAdapter,
    test_file: &TestFile,
) -> Result<Vec<TestResult>> {
    let feature = Feature::from_name(&test_file.feature)
        .ok_or_else(|| BenchError::Other(format!("unknown feature '{}'", test_file.feature)))?;
    debug!(
        "read run: {} against {}",
        test_file.path,
        adapter.info().name
    );
    let mut book = adapter.open_workbook(Path::new(&test_file.path))?;
    let mut results = Vec::with_capacity(test_file.test_cases.len());
    for tc in &test_file.test_cases {
        let sheet = case_sheet(tc, test_file);
        results.push(run_read_case(book.as_ref(), feature, &sheet, tc));
    }
    book.close()?;
    Ok(results)
}

/// Delete a stale output file and any `~$`-prefixed lock artifact beside it.
/// Best effort: failures are ignored, the subsequent create reports them.
fn remove_stale_output(path: &Path) {
    let _ = fs::remove_file(path);
    if let (Some(dir), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str())) {
        let _ = fs::remove_file(dir.join(format!("~${name}")));
    }
}

/// Run every case of a fixture file through a writing adapter, then verify
/// the produced file by reading it back with `verifier`.
pub fn run_write_file(
    writer: &dyn SpreadsheetAdapter,
    verifier: &dyn SpreadsheetAdapter,
    test_file: &TestFile,
    output_path: &Path,
) -> Result<Vec<TestResult>> {
    let feature = Feature::from_name(&test_file.feature)
        .ok_or_else(|| BenchError::Other(format!("unknown feature '{}'", test_file.feature)))?;
    debug!(
        "write run: {} via {} verified by {}",
        test_file.feature,
        writer.info().name,
        verifier.info().name
    );

    remove_stale_output(output_path);

    let mut book = writer.create_workbook(output_path)?;
    let mut write_errors: BTreeMap<String, String> = BTreeMap::new();

    for sheet in collect_sheet_names(test_file) {
        if let Err(err) = book.add_sheet(&sheet) {
            let _ = book.close();
            return Err(err);
        }
    }
    for tc in &test_file.test_cases {
        let sheet = case_sheet(tc, test_file);
        if let Err(err) = write_case(book.as_mut(), feature, &sheet, tc) {
            warn!("case {}: write failed: {err}", tc.id);
            write_errors.insert(tc.id.clone(), err.to_string());
        }
    }

    let saved = book.save();
    let _ = book.close();
    saved?;

    let mut reader = verifier.open_workbook(output_path)?;
    let mut results = Vec::with_capacity(test_file.test_cases.len());
    for tc in &test_file.test_cases {
        let sheet = case_sheet(tc, test_file);
        let mut result = build_case_result(reader.as_ref(), feature, &sheet, tc, Operation::Write);
        if let Some(err) = write_errors.get(&tc.id) {
            result.passed = false;
            result.notes = Some(err.clone());
        }
        results.push(result);
    }
    reader.close()?;
    Ok(results)
}

/// Roll a mixed result list into a `FeatureScore`: read and write results
/// are scored independently; an operation with no results scores `None`.
pub fn score_feature(feature: &str, library: &str, results: Vec<TestResult>) -> FeatureScore {
    let score_for = |op: Operation| {
        let subset: Vec<TestResult> = results
            .iter()
            .filter(|r| r.operation == op)
            .cloned()
            .collect();
        if subset.is_empty() {
            None
        } else {
            Some(calculate_score(&subset))
        }
    };
    FeatureScore {
        feature: feature.into(),
        library: library.into(),
        read_score: score_for(Operation::Read),
        write_score: score_for(Operation::Write),
        test_results: results,
    }
}
