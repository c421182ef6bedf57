//! End-to-end harness runs: fixtures written through the built-in adapter,
//! verified by reading the output back, then scored.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use common::{basic_case, edge_case, fixture};
use xlbench::adapters::NativeAdapter;
use xlbench::models::{Operation, TestCase, TestFile};
use xlbench::SpreadsheetAdapter;
use xlbench::runner::{run_read_file, run_write_file, score_feature};

fn write_and_verify(test_file: &TestFile, dir: &TempDir) -> (PathBuf, Vec<xlbench::TestResult>) {
    let adapter = NativeAdapter::new();
    let output = dir.path().join(format!("{}.xlsx", test_file.feature));
    let results = run_write_file(&adapter, &adapter, test_file, &output).unwrap();
    (output, results)
}

fn assert_all_passed(results: &[xlbench::TestResult]) {
    for result in results {
        assert!(
            result.passed,
            "case {} failed: expected {:?}, actual {:?}, notes {:?}",
            result.test_case_id, result.expected, result.actual, result.notes
        );
    }
}

#[test]
fn cell_values_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "cell_values",
        1,
        "unused.xlsx",
        vec![
            basic_case("string", 2, json!({"type": "string", "value": "Hello"})),
            basic_case("number", 3, json!({"type": "number", "value": 42.5})),
            basic_case("integer", 4, json!({"type": "number", "value": -17.0})),
            basic_case("boolean", 5, json!({"type": "boolean", "value": true})),
            basic_case("date", 6, json!({"type": "date", "value": "2023-03-15"})),
            basic_case(
                "datetime",
                7,
                json!({"type": "datetime", "value": "2023-03-15T13:30:00"}),
            ),
            edge_case("blank", 8, json!({"type": "blank"})),
            edge_case("error", 9, json!({"type": "error", "value": "#DIV/0!"})),
            edge_case("unicode", 10, json!({"type": "string", "value": "héllo <&> wörld"})),
        ],
    );
    let (output, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);

    // The produced file also serves as a read fixture.
    let read_file = TestFile {
        path: output.to_string_lossy().into_owned(),
        ..test_file
    };
    let read_results = run_read_file(&NativeAdapter::new(), &read_file).unwrap();
    assert_all_passed(&read_results);
    assert!(read_results.iter().all(|r| r.operation == Operation::Read));
}

#[test]
fn formulas_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "formulas",
        1,
        "unused.xlsx",
        vec![
            basic_case(
                "sum",
                2,
                json!({"type": "formula", "formula": "=SUM(A1:A5)", "value": 15.0}),
            ),
            basic_case(
                "concat",
                3,
                json!({"type": "formula", "formula": "=CONCATENATE(\"a\",\"b\")", "value": "ab"}),
            ),
            edge_case(
                "no_cached_value",
                4,
                json!({"type": "formula", "formula": "=NOW()"}),
            ),
        ],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn number_formats_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "number_formats",
        1,
        "unused.xlsx",
        vec![
            basic_case(
                "thousands",
                2,
                json!({"type": "number", "value": 1234.5, "number_format": "#,##0.00"}),
            ),
            basic_case(
                "percent",
                3,
                json!({"type": "number", "value": 0.25, "number_format": "0%"}),
            ),
            edge_case(
                "escaped_literal",
                4,
                json!({"type": "number", "value": 5.0, "number_format": "0.0\\-"}),
            ),
        ],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn multiple_sheets_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut on_alpha = basic_case(
        "sheet_list",
        2,
        json!({"sheet_names": ["multiple_sheets", "Alpha"]}),
    );
    on_alpha.sheet = Some("Alpha".to_string());
    let test_file = fixture("multiple_sheets", 1, "unused.xlsx", vec![on_alpha]);
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn merged_cells_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "merged_cells",
        2,
        "unused.xlsx",
        vec![basic_case(
            "simple_merge",
            2,
            json!({
                "merged_range": "B2:C3",
                "top_left_value": "merged",
                "non_top_left_nonempty": 0,
            }),
        )],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn conditional_formatting_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "conditional_formatting",
        2,
        "unused.xlsx",
        vec![basic_case(
            "cell_is_greater",
            2,
            json!({
                "cf_rule": {
                    "range": "B2:B10",
                    "rule_type": "cellIs",
                    "operator": "greaterThan",
                    "formula": "=100",
                }
            }),
        )],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn data_validation_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "data_validation",
        2,
        "unused.xlsx",
        vec![basic_case(
            "list_validation",
            2,
            json!({
                "validation": {
                    "range": "B2:B10",
                    "validation_type": "list",
                    "formula1": "\"red,green,blue\"",
                    "allow_blank": true,
                }
            }),
        )],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn hyperlinks_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "hyperlinks",
        2,
        "unused.xlsx",
        vec![
            basic_case(
                "external",
                2,
                json!({
                    "hyperlink": {
                        "cell": "B2",
                        "target": "https://example.com/",
                        "display": "Example",
                    }
                }),
            ),
            edge_case(
                "internal",
                3,
                json!({
                    "hyperlink": {
                        "cell": "B3",
                        "target": "hyperlinks!A1",
                        "internal": true,
                    }
                }),
            ),
        ],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn freeze_panes_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "freeze_panes",
        2,
        "unused.xlsx",
        vec![basic_case(
            "freeze_top_left",
            2,
            json!({
                "freeze": {
                    "mode": "freeze",
                    "top_left_cell": "B2",
                    "x_split": 1,
                    "y_split": 1,
                }
            }),
        )],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn dimensions_round_trip() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "dimensions",
        1,
        "unused.xlsx",
        vec![
            basic_case("row_height", 2, json!({"row_height": 30.0})),
            basic_case(
                "column_width",
                3,
                json!({"column_width": 25.0, "column": "D"}),
            ),
        ],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);
}

#[test]
fn failed_case_keeps_both_payloads() {
    let dir = TempDir::new().unwrap();
    let adapter = NativeAdapter::new();
    // The adapter has no image support, so the sentinel read misses.
    let test_file = fixture(
        "images",
        2,
        "unused.xlsx",
        vec![basic_case(
            "png_anchor",
            2,
            json!({"image": {"cell": "B2", "format": "png"}}),
        )],
    );
    let output = dir.path().join("images.xlsx");
    let results = run_write_file(&adapter, &adapter, &test_file, &output).unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].passed);
    assert!(results[0].actual.is_empty());
    assert!(!results[0].expected.is_empty());
}

#[test]
fn scoring_mixed_results() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "cell_values",
        1,
        "unused.xlsx",
        vec![
            basic_case("ok", 2, json!({"type": "string", "value": "yes"})),
            // The comparator sees a number where a different one was promised.
            basic_case("bad", 3, json!({"type": "number", "value": 1.0, "extra_key": "x"})),
        ],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    assert!(results[0].passed);
    assert!(!results[1].passed);

    let score = score_feature("cell_values", "native", results);
    assert_eq!(score.write_score, Some(1));
    assert_eq!(score.read_score, None);
}

#[test]
fn perfect_feature_scores_three() {
    let dir = TempDir::new().unwrap();
    let test_file = fixture(
        "cell_values",
        1,
        "unused.xlsx",
        vec![
            basic_case("a", 2, json!({"type": "string", "value": "a"})),
            edge_case("b", 3, json!({"type": "blank"})),
        ],
    );
    let (_, results) = write_and_verify(&test_file, &dir);
    let score = score_feature("cell_values", "native", results);
    assert_eq!(score.write_score, Some(3));
}

#[test]
fn stale_output_is_replaced() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cell_values.xlsx");
    std::fs::write(&output, b"not a zip").unwrap();
    std::fs::write(dir.path().join("~$cell_values.xlsx"), b"lock").unwrap();

    let test_file = fixture(
        "cell_values",
        1,
        "unused.xlsx",
        vec![basic_case("only", 2, json!({"type": "string", "value": "v"}))],
    );
    let adapter = NativeAdapter::new();
    let results = run_write_file(&adapter, &adapter, &test_file, &output).unwrap();
    assert_all_passed(&results);
    assert!(!dir.path().join("~$cell_values.xlsx").exists());
}

#[test]
fn case_sheets_create_their_worksheets() {
    let dir = TempDir::new().unwrap();
    let mut case_b: TestCase = basic_case("on_extra", 3, json!({"type": "number", "value": 7.0}));
    case_b.sheet = Some("Extra".to_string());
    let test_file = fixture(
        "cell_values",
        1,
        "unused.xlsx",
        vec![
            basic_case("on_default", 2, json!({"type": "string", "value": "main"})),
            case_b,
        ],
    );
    let (output, results) = write_and_verify(&test_file, &dir);
    assert_all_passed(&results);

    let book = NativeAdapter::new().open_workbook(&output).unwrap();
    let names = book.sheet_names().unwrap();
    assert_eq!(names, ["cell_values", "Extra"]);
}
