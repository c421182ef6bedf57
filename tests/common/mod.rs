//! Shared fixtures for the integration suites: test-case builders and a raw
//! XLSX byte builder for reader inputs the built-in writer never produces.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::io::{Cursor, Write};

use serde_json::Value;
use zip::write::FileOptions;
use zip::ZipWriter;

use xlbench::models::{Importance, TestCase, TestFile};

pub type JsonMap = serde_json::Map<String, Value>;

pub fn obj(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn basic_case(id: &str, row: u32, expected: Value) -> TestCase {
    TestCase {
        id: id.to_string(),
        label: id.replace('_', " "),
        row,
        expected: obj(expected),
        importance: Importance::Basic,
        sheet: None,
    }
}

pub fn edge_case(id: &str, row: u32, expected: Value) -> TestCase {
    TestCase {
        importance: Importance::Edge,
        ..basic_case(id, row, expected)
    }
}

pub fn fixture(feature: &str, tier: u8, path: &str, test_cases: Vec<TestCase>) -> TestFile {
    TestFile {
        path: path.to_string(),
        feature: feature.to_string(),
        tier,
        test_cases,
    }
}

/// Build an XLSX byte vector from (archive path, content) pairs.
pub fn build_xlsx(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, content) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

pub const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

pub const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

pub const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

pub fn workbook_xml(sheet_name: &str, date1904: bool) -> String {
    let pr = if date1904 {
        r#"<workbookPr date1904="1"/>"#
    } else {
        ""
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  {pr}
  <sheets>
    <sheet name="{sheet_name}" sheetId="1" r:id="rId1"/>
  </sheets>
</workbook>"#
    )
}

/// A single-sheet XLSX with the given sheet XML, plus optional shared
/// strings and styles parts.
pub fn single_sheet_xlsx(
    sheet_name: &str,
    sheet_xml: &str,
    shared_strings: Option<&str>,
    styles: Option<&str>,
    date1904: bool,
) -> Vec<u8> {
    let workbook = workbook_xml(sheet_name, date1904);
    let mut parts: Vec<(&str, &str)> = vec![
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", RELS_XML),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ];
    if let Some(sst) = shared_strings {
        parts.push(("xl/sharedStrings.xml", sst));
    }
    if let Some(styles) = styles {
        parts.push(("xl/styles.xml", styles));
    }
    build_xlsx(&parts)
}
