//! Built-in adapter reader tests over hand-built XLSX archives, covering
//! inputs the adapter's own writer never produces (shared strings, builtin
//! date styles, the 1904 date system).
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
use tempfile::TempDir;

use common::single_sheet_xlsx;
use xlbench::adapters::NativeAdapter;
use xlbench::models::{CellScalar, CellType};
use xlbench::{SpreadsheetAdapter, Workbook};

fn write_bytes(dir: &TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("fixture.xlsx");
    std::fs::write(&path, bytes).unwrap();
    path
}

fn open(dir: &TempDir, bytes: &[u8]) -> Box<dyn Workbook> {
    let path = write_bytes(dir, bytes);
    NativeAdapter::new().open_workbook(&path).unwrap()
}

#[test]
fn shared_string_cells_resolve() {
    let sheet = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="2"><c r="B2" t="s"><v>0</v></c><c r="C2" t="s"><v>1</v></c></row>
  </sheetData>
</worksheet>"#;
    let sst = r#"<?xml version="1.0"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
  <si><t>Hello World</t></si>
  <si><r><t>Rich</t></r><r><t> Text</t></r></si>
</sst>"#;
    let dir = TempDir::new().unwrap();
    let book = open(&dir, &single_sheet_xlsx("Data", sheet, Some(sst), None, false));

    let cell = book.read_cell("Data", "B2").unwrap();
    assert_eq!(cell.cell_type, CellType::String);
    assert_eq!(cell.value, Some(CellScalar::Text("Hello World".into())));

    // Run concatenation for rich-text entries.
    let rich = book.read_cell("Data", "C2").unwrap();
    assert_eq!(rich.value, Some(CellScalar::Text("Rich Text".into())));
}

#[test]
fn builtin_date_style_types_the_cell() {
    // numFmtId 14 is the builtin short date; no custom numFmts block.
    let styles = r#"<?xml version="1.0"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cellXfs count="2">
    <xf numFmtId="0"/>
    <xf numFmtId="14" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;
    let sheet = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="2"><c r="B2" s="1"><v>45000</v></c></row>
  </sheetData>
</worksheet>"#;
    let dir = TempDir::new().unwrap();
    let book = open(&dir, &single_sheet_xlsx("Data", sheet, None, Some(styles), false));

    let cell = book.read_cell("Data", "B2").unwrap();
    assert_eq!(cell.cell_type, CellType::Date);
    assert_eq!(cell.value, Some(CellScalar::Text("2023-03-15".into())));
}

#[test]
fn date1904_serials_shift_the_epoch() {
    let styles = r#"<?xml version="1.0"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts>
  <cellXfs count="2">
    <xf numFmtId="0"/>
    <xf numFmtId="164" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;
    let sheet = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="2"><c r="B2" s="1"><v>0</v></c></row>
  </sheetData>
</worksheet>"#;
    let dir = TempDir::new().unwrap();
    let book = open(&dir, &single_sheet_xlsx("Data", sheet, None, Some(styles), true));

    let cell = book.read_cell("Data", "B2").unwrap();
    assert_eq!(cell.cell_type, CellType::Date);
    assert_eq!(cell.value, Some(CellScalar::Text("1904-01-01".into())));
}

#[test]
fn unstyled_serial_stays_a_number() {
    let sheet = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="2"><c r="B2"><v>45000</v></c></row>
  </sheetData>
</worksheet>"#;
    let dir = TempDir::new().unwrap();
    let book = open(&dir, &single_sheet_xlsx("Data", sheet, None, None, false));

    let cell = book.read_cell("Data", "B2").unwrap();
    assert_eq!(cell.cell_type, CellType::Number);
    assert_eq!(cell.value, Some(CellScalar::Number(45000.0)));
}

#[test]
fn missing_cell_reads_blank() {
    let sheet = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData/>
</worksheet>"#;
    let dir = TempDir::new().unwrap();
    let book = open(&dir, &single_sheet_xlsx("Data", sheet, None, None, false));

    let cell = book.read_cell("Data", "Z99").unwrap();
    assert_eq!(cell.cell_type, CellType::Blank);
    assert_eq!(cell.value, None);
}

#[test]
fn unknown_sheet_is_an_error() {
    let sheet = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData/>
</worksheet>"#;
    let dir = TempDir::new().unwrap();
    let book = open(&dir, &single_sheet_xlsx("Data", sheet, None, None, false));
    assert!(book.read_cell("Nope", "A1").is_err());
}

#[test]
fn garbage_file_is_a_format_error() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(&dir, b"this is not a zip archive");
    assert!(NativeAdapter::new().open_workbook(&path).is_err());
}

#[test]
fn missing_workbook_part_is_a_format_error() {
    let dir = TempDir::new().unwrap();
    let bytes = common::build_xlsx(&[("[Content_Types].xml", common::CONTENT_TYPES_XML)]);
    let path = write_bytes(&dir, &bytes);
    assert!(NativeAdapter::new().open_workbook(&path).is_err());
}
