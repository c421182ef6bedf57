//! Workbook generation: in-memory model to zip archive.
//!
//! Every part is regenerated on save. Strings are written inline
//! (`t="inlineStr"`) so no shared-string table is needed; dates are written
//! as serial numbers carrying a date number format so they read back typed.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{CellEntry, SheetModel};
use crate::cell_ref::{col_to_letter, parse_cell_ref};
use crate::dates;
use crate::error::{BenchError, Result};
use crate::models::{CellScalar, CellType};
use crate::specs::{ConditionalFormatSpec, DataValidationSpec, HyperlinkSpec};

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// First id available for custom number formats.
const CUSTOM_NUMFMT_BASE: usize = 164;

pub(super) fn save_workbook(path: &Path, sheets: &[SheetModel], date1904: bool) -> Result<()> {
    let styles = StyleTable::collect(sheets);

    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options: FileOptions = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let part = |zip: &mut ZipWriter<File>, name: &str, content: &str| -> Result<()> {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
        Ok(())
    };

    part(&mut zip, "[Content_Types].xml", &content_types(sheets.len()))?;
    part(&mut zip, "_rels/.rels", ROOT_RELS)?;
    part(&mut zip, "xl/workbook.xml", &workbook_xml(sheets, date1904))?;
    part(
        &mut zip,
        "xl/_rels/workbook.xml.rels",
        &workbook_rels(sheets.len()),
    )?;
    part(&mut zip, "xl/styles.xml", &styles.to_xml())?;

    for (idx, sheet) in sheets.iter().enumerate() {
        let n = idx + 1;
        part(
            &mut zip,
            &format!("xl/worksheets/sheet{n}.xml"),
            &sheet_xml(sheet, &styles, date1904)?,
        )?;
        if sheet.hyperlinks.iter().any(is_external) {
            part(
                &mut zip,
                &format!("xl/worksheets/_rels/sheet{n}.xml.rels"),
                &sheet_rels(&sheet.hyperlinks),
            )?;
        }
    }

    zip.finish()?;
    Ok(())
}

fn is_external(link: &HyperlinkSpec) -> bool {
    link.internal != Some(true)
}

/// Deduplicated number formats and their cellXfs slots. Xf 0 is the General
/// default; each distinct format code gets one xf.
struct StyleTable {
    codes: Vec<String>,
}

impl StyleTable {
    fn collect(sheets: &[SheetModel]) -> Self {
        let mut codes: Vec<String> = Vec::new();
        for sheet in sheets {
            for entry in sheet.cells.values() {
                if let Some(code) = effective_format(entry) {
                    if !codes.contains(&code) {
                        codes.push(code);
                    }
                }
            }
        }
        Self { codes }
    }

    /// The `s` attribute for a cell, if it carries a number format.
    fn xf_index(&self, entry: &CellEntry) -> Option<usize> {
        let code = effective_format(entry)?;
        self.codes.iter().position(|c| *c == code).map(|i| i + 1)
    }

    fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str(XML_DECL);
        out.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        if !self.codes.is_empty() {
            out.push_str(&format!("<numFmts count=\"{}\">", self.codes.len()));
            for (i, code) in self.codes.iter().enumerate() {
                out.push_str(&format!(
                    "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    CUSTOM_NUMFMT_BASE + i,
                    xml_escape(code)
                ));
            }
            out.push_str("</numFmts>");
        }
        out.push_str(r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#);
        out.push_str(concat!(
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill>"#,
            r#"<fill><patternFill patternType="gray125"/></fill></fills>"#,
        ));
        out.push_str(r#"<borders count="1"><border/></borders>"#);
        out.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0"/></cellStyleXfs>"#);
        out.push_str(&format!("<cellXfs count=\"{}\">", self.codes.len() + 1));
        out.push_str(r#"<xf numFmtId="0" fontId="0" xfId="0"/>"#);
        for i in 0..self.codes.len() {
            out.push_str(&format!(
                "<xf numFmtId=\"{}\" fontId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/>",
                CUSTOM_NUMFMT_BASE + i
            ));
        }
        out.push_str("</cellXfs>");
        out.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        out.push_str("</styleSheet>");
        out
    }
}

fn effective_format(entry: &CellEntry) -> Option<String> {
    entry.number_format.clone().or(match entry.value.cell_type {
        CellType::Date => Some(DATE_FORMAT.to_string()),
        CellType::Datetime => Some(DATETIME_FORMAT.to_string()),
        _ => None,
    })
}

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

const ROOT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    "</Relationships>",
);

fn content_types(sheet_count: usize) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(XML_DECL);
    out.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    out.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    out.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    out.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    out.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    for n in 1..=sheet_count {
        out.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/sheet{n}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>"
        ));
    }
    out.push_str("</Types>");
    out
}

fn workbook_xml(sheets: &[SheetModel], date1904: bool) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push_str(concat!(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    ));
    if date1904 {
        out.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    out.push_str("<sheets>");
    for (idx, sheet) in sheets.iter().enumerate() {
        let n = idx + 1;
        out.push_str(&format!(
            "<sheet name=\"{}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>",
            xml_escape(&sheet.name)
        ));
    }
    out.push_str("</sheets></workbook>");
    out
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for n in 1..=sheet_count {
        out.push_str(&format!(
            "<Relationship Id=\"rId{n}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{n}.xml\"/>"
        ));
    }
    out.push_str(&format!(
        "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
        sheet_count + 1
    ));
    out.push_str("</Relationships>");
    out
}

fn letter_to_col(letters: &str) -> Option<u32> {
    parse_cell_ref(&format!("{letters}1")).map(|(col, _)| col)
}

fn sheet_xml(sheet: &SheetModel, styles: &StyleTable, date1904: bool) -> Result<String> {
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECL);
    out.push_str(concat!(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    ));
    out.push('\n');

    if let Some(freeze) = &sheet.freeze {
        out.push_str("<sheetViews><sheetView workbookViewId=\"0\">");
        out.push_str("<pane");
        if let Some(x) = freeze.x_split {
            out.push_str(&format!(" xSplit=\"{x}\""));
        }
        if let Some(y) = freeze.y_split {
            out.push_str(&format!(" ySplit=\"{y}\""));
        }
        if let Some(cell) = &freeze.top_left_cell {
            out.push_str(&format!(" topLeftCell=\"{}\"", xml_escape(cell)));
        }
        if let Some(pane) = &freeze.active_pane {
            out.push_str(&format!(" activePane=\"{}\"", xml_escape(pane)));
        }
        if freeze.mode == "freeze" {
            out.push_str(" state=\"frozen\"");
        }
        out.push_str("/></sheetView></sheetViews>\n");
    }

    if !sheet.col_widths.is_empty() {
        out.push_str("<cols>");
        for (letters, width) in &sheet.col_widths {
            if let Some(col) = letter_to_col(letters) {
                let col1 = col + 1;
                out.push_str(&format!(
                    "<col min=\"{col1}\" max=\"{col1}\" width=\"{width}\" customWidth=\"1\"/>"
                ));
            }
        }
        out.push_str("</cols>\n");
    }

    out.push_str("<sheetData>\n");
    write_sheet_data(&mut out, sheet, styles, date1904)?;
    out.push_str("</sheetData>\n");

    if !sheet.merges.is_empty() {
        out.push_str(&format!("<mergeCells count=\"{}\">", sheet.merges.len()));
        for merge in &sheet.merges {
            out.push_str(&format!("<mergeCell ref=\"{}\"/>", xml_escape(merge)));
        }
        out.push_str("</mergeCells>\n");
    }

    for (idx, rule) in sheet.cf_rules.iter().enumerate() {
        write_cf_rule(&mut out, rule, idx);
    }

    if !sheet.validations.is_empty() {
        out.push_str(&format!(
            "<dataValidations count=\"{}\">",
            sheet.validations.len()
        ));
        for validation in &sheet.validations {
            write_validation(&mut out, validation);
        }
        out.push_str("</dataValidations>\n");
    }

    if !sheet.hyperlinks.is_empty() {
        out.push_str("<hyperlinks>");
        let mut rid = 0;
        for link in &sheet.hyperlinks {
            if is_external(link) {
                rid += 1;
                out.push_str(&format!(
                    "<hyperlink ref=\"{}\" r:id=\"rId{rid}\"",
                    xml_escape(&link.cell)
                ));
            } else {
                out.push_str(&format!(
                    "<hyperlink ref=\"{}\" location=\"{}\"",
                    xml_escape(&link.cell),
                    xml_escape(&link.target)
                ));
            }
            if let Some(display) = &link.display {
                out.push_str(&format!(" display=\"{}\"", xml_escape(display)));
            }
            if let Some(tooltip) = &link.tooltip {
                out.push_str(&format!(" tooltip=\"{}\"", xml_escape(tooltip)));
            }
            out.push_str("/>");
        }
        out.push_str("</hyperlinks>\n");
    }

    out.push_str("</worksheet>");
    Ok(out)
}

fn write_sheet_data(
    out: &mut String,
    sheet: &SheetModel,
    styles: &StyleTable,
    date1904: bool,
) -> Result<()> {
    // BTreeMap keys are (row, col), so cells arrive row-grouped and ordered.
    let mut rows: BTreeMap<u32, Vec<(u32, &CellEntry)>> = BTreeMap::new();
    for ((row, col), entry) in &sheet.cells {
        rows.entry(*row).or_default().push((*col, entry));
    }
    // Rows with only a height still need a <row> element.
    for row1 in sheet.row_heights.keys() {
        rows.entry(row1.saturating_sub(1)).or_default();
    }

    for (row, cells) in &rows {
        let row1 = row + 1;
        out.push_str(&format!("<row r=\"{row1}\""));
        if let Some(height) = sheet.row_heights.get(&row1) {
            out.push_str(&format!(" ht=\"{height}\" customHeight=\"1\""));
        }
        out.push('>');
        for (col, entry) in cells {
            write_cell(out, *row, *col, entry, styles, date1904)?;
        }
        out.push_str("</row>\n");
    }
    Ok(())
}

fn write_cell(
    out: &mut String,
    row: u32,
    col: u32,
    entry: &CellEntry,
    styles: &StyleTable,
    date1904: bool,
) -> Result<()> {
    let cell_ref = format!("{}{}", col_to_letter(col), row + 1);
    out.push_str(&format!("<c r=\"{cell_ref}\""));
    if let Some(s) = styles.xf_index(entry) {
        out.push_str(&format!(" s=\"{s}\""));
    }

    let value = &entry.value;
    let formula = value
        .formula
        .as_deref()
        .map(|f| f.strip_prefix('=').unwrap_or(f));

    match value.cell_type {
        CellType::Blank => {
            out.push_str("/>");
            return Ok(());
        }
        CellType::String => {
            out.push_str(" t=\"inlineStr\">");
            let text = value.value.as_ref().and_then(CellScalar::as_text).unwrap_or("");
            out.push_str(&format!("<is><t>{}</t></is>", xml_escape(text)));
        }
        CellType::Boolean => {
            out.push_str(" t=\"b\">");
            let bit = match value.value {
                Some(CellScalar::Bool(true)) => "1",
                _ => "0",
            };
            out.push_str(&format!("<v>{bit}</v>"));
        }
        CellType::Number => {
            out.push('>');
            let n = value.value.as_ref().and_then(CellScalar::as_number).unwrap_or(0.0);
            out.push_str(&format!("<v>{n}</v>"));
        }
        CellType::Date | CellType::Datetime => {
            let text = value
                .value
                .as_ref()
                .and_then(CellScalar::as_text)
                .unwrap_or_default();
            let parts = dates::parse_iso(text)
                .ok_or_else(|| BenchError::FileFormat(format!("bad date value '{text}'")))?;
            out.push('>');
            let serial = dates::parts_to_serial(parts, date1904);
            out.push_str(&format!("<v>{serial}</v>"));
        }
        CellType::Error => {
            out.push_str(" t=\"e\">");
            let text = value
                .value
                .as_ref()
                .and_then(CellScalar::as_text)
                .unwrap_or("#VALUE!");
            out.push_str(&format!("<v>{}</v>", xml_escape(text)));
        }
        CellType::Formula => {
            // Cached result decides the value representation.
            match value.value.as_ref() {
                Some(CellScalar::Number(n)) => {
                    out.push('>');
                    if let Some(f) = formula {
                        out.push_str(&format!("<f>{}</f>", xml_escape(f)));
                    }
                    out.push_str(&format!("<v>{n}</v>"));
                }
                Some(CellScalar::Bool(b)) => {
                    out.push_str(" t=\"b\">");
                    if let Some(f) = formula {
                        out.push_str(&format!("<f>{}</f>", xml_escape(f)));
                    }
                    out.push_str(&format!("<v>{}</v>", i32::from(*b)));
                }
                Some(CellScalar::Text(text)) => {
                    out.push_str(" t=\"str\">");
                    if let Some(f) = formula {
                        out.push_str(&format!("<f>{}</f>", xml_escape(f)));
                    }
                    out.push_str(&format!("<v>{}</v>", xml_escape(text)));
                }
                None => {
                    out.push('>');
                    if let Some(f) = formula {
                        out.push_str(&format!("<f>{}</f>", xml_escape(f)));
                    }
                }
            }
        }
    }

    out.push_str("</c>");
    Ok(())
}

fn write_cf_rule(out: &mut String, rule: &ConditionalFormatSpec, idx: usize) {
    out.push_str(&format!(
        "<conditionalFormatting sqref=\"{}\">",
        xml_escape(&rule.range)
    ));
    out.push_str(&format!("<cfRule type=\"{}\"", xml_escape(&rule.rule_type)));
    if let Some(operator) = &rule.operator {
        out.push_str(&format!(" operator=\"{}\"", xml_escape(operator)));
    }
    let priority = rule
        .priority
        .unwrap_or_else(|| i64::try_from(idx).unwrap_or(0) + 1);
    out.push_str(&format!(" priority=\"{priority}\""));
    if rule.stop_if_true == Some(true) {
        out.push_str(" stopIfTrue=\"1\"");
    }
    out.push('>');
    if let Some(formula) = &rule.formula {
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        out.push_str(&format!("<formula>{}</formula>", xml_escape(formula)));
    }
    out.push_str("</cfRule></conditionalFormatting>\n");
}

fn write_validation(out: &mut String, validation: &DataValidationSpec) {
    out.push_str(&format!(
        "<dataValidation type=\"{}\"",
        xml_escape(&validation.validation_type)
    ));
    if let Some(operator) = &validation.operator {
        out.push_str(&format!(" operator=\"{}\"", xml_escape(operator)));
    }
    let mut flag = |name: &str, value: Option<bool>| {
        if value == Some(true) {
            out.push_str(&format!(" {name}=\"1\""));
        }
    };
    flag("allowBlank", validation.allow_blank);
    flag("showInputMessage", validation.show_input);
    flag("showErrorMessage", validation.show_error);
    let mut text_attr = |name: &str, value: &Option<String>| {
        if let Some(v) = value {
            out.push_str(&format!(" {name}=\"{}\"", xml_escape(v)));
        }
    };
    text_attr("promptTitle", &validation.prompt_title);
    text_attr("prompt", &validation.prompt);
    text_attr("errorTitle", &validation.error_title);
    text_attr("error", &validation.error);
    out.push_str(&format!(" sqref=\"{}\">", xml_escape(&validation.range)));
    if let Some(formula1) = &validation.formula1 {
        out.push_str(&format!("<formula1>{}</formula1>", xml_escape(formula1)));
    }
    if let Some(formula2) = &validation.formula2 {
        out.push_str(&format!("<formula2>{}</formula2>", xml_escape(formula2)));
    }
    out.push_str("</dataValidation>");
}

fn sheet_rels(hyperlinks: &[HyperlinkSpec]) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    let mut rid = 0;
    for link in hyperlinks {
        if is_external(link) {
            rid += 1;
            out.push_str(&format!(
                "<Relationship Id=\"rId{rid}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink\" Target=\"{}\" TargetMode=\"External\"/>",
                xml_escape(&link.target)
            ));
        }
    }
    out.push_str("</Relationships>");
    out
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn entry(value: CellValue) -> CellEntry {
        CellEntry {
            value,
            number_format: None,
        }
    }

    #[test]
    fn style_table_deduplicates_codes() {
        let mut sheet = SheetModel::named("s");
        sheet.cells.insert(
            (0, 0),
            CellEntry {
                value: CellValue::number(1.0),
                number_format: Some("0.00".into()),
            },
        );
        sheet.cells.insert(
            (0, 1),
            CellEntry {
                value: CellValue::number(2.0),
                number_format: Some("0.00".into()),
            },
        );
        let styles = StyleTable::collect(std::slice::from_ref(&sheet));
        assert_eq!(styles.codes, ["0.00"]);
        let first = sheet.cells.get(&(0, 0)).unwrap();
        assert_eq!(styles.xf_index(first), Some(1));
    }

    #[test]
    fn date_cells_get_an_implicit_format() {
        let e = CellEntry {
            value: CellValue {
                cell_type: CellType::Date,
                value: Some(CellScalar::Text("2026-01-15".into())),
                formula: None,
            },
            number_format: None,
        };
        assert_eq!(effective_format(&e).as_deref(), Some(DATE_FORMAT));
    }

    #[test]
    fn string_cell_is_inline() {
        let styles = StyleTable { codes: Vec::new() };
        let mut out = String::new();
        write_cell(&mut out, 1, 1, &entry(CellValue::string("A & B")), &styles, false).unwrap();
        assert_eq!(out, "<c r=\"B2\" t=\"inlineStr\"><is><t>A &amp; B</t></is></c>");
    }

    #[test]
    fn formula_cell_strips_equals_and_keeps_cache() {
        let styles = StyleTable { codes: Vec::new() };
        let value = CellValue {
            cell_type: CellType::Formula,
            value: Some(CellScalar::Number(15.0)),
            formula: Some("=SUM(A1:A5)".into()),
        };
        let mut out = String::new();
        write_cell(&mut out, 0, 0, &entry(value), &styles, false).unwrap();
        assert_eq!(out, "<c r=\"A1\"><f>SUM(A1:A5)</f><v>15</v></c>");
    }

    #[test]
    fn date_cell_serializes_as_serial() {
        let styles = StyleTable {
            codes: vec![DATE_FORMAT.to_string()],
        };
        let value = CellValue {
            cell_type: CellType::Date,
            value: Some(CellScalar::Text("1900-01-01".into())),
            formula: None,
        };
        let mut out = String::new();
        write_cell(&mut out, 0, 0, &entry(value), &styles, false).unwrap();
        assert_eq!(out, "<c r=\"A1\" s=\"1\"><v>1</v></c>");
    }

    #[test]
    fn bad_date_value_is_a_format_error() {
        let styles = StyleTable { codes: Vec::new() };
        let value = CellValue {
            cell_type: CellType::Date,
            value: Some(CellScalar::Text("garbage".into())),
            formula: None,
        };
        let mut out = String::new();
        assert!(matches!(
            write_cell(&mut out, 0, 0, &entry(value), &styles, false),
            Err(BenchError::FileFormat(_))
        ));
    }

    #[test]
    fn validation_xml_shape() {
        let spec = DataValidationSpec {
            range: "A1:A10".into(),
            validation_type: "list".into(),
            allow_blank: Some(true),
            formula1: Some("\"a,b\"".into()),
            ..DataValidationSpec::default()
        };
        let mut out = String::new();
        write_validation(&mut out, &spec);
        assert!(out.contains("type=\"list\""));
        assert!(out.contains("allowBlank=\"1\""));
        assert!(out.contains("<formula1>&quot;a,b&quot;</formula1>"));
        assert!(!out.contains("operator="));
    }

    #[test]
    fn workbook_xml_names_and_rids() {
        let sheets = vec![SheetModel::named("First"), SheetModel::named("Se<ond")];
        let xml = workbook_xml(&sheets, false);
        assert!(xml.contains("name=\"First\" sheetId=\"1\" r:id=\"rId1\""));
        assert!(xml.contains("name=\"Se&lt;ond\" sheetId=\"2\" r:id=\"rId2\""));
        assert!(!xml.contains("date1904"));
    }

    #[test]
    fn cf_rule_defaults_priority_from_position() {
        let rule = ConditionalFormatSpec {
            range: "B2:B6".into(),
            rule_type: "cellIs".into(),
            operator: Some("greaterThan".into()),
            formula: Some("=100".into()),
            ..ConditionalFormatSpec::default()
        };
        let mut out = String::new();
        write_cf_rule(&mut out, &rule, 2);
        assert!(out.contains("priority=\"3\""));
        assert!(out.contains("<formula>100</formula>"));
    }
}
