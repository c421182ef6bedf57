//! Workbook parsing: zip archive to in-memory model.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{CellEntry, SheetModel};
use crate::cell_ref::{col_to_letter, parse_cell_ref};
use crate::dates;
use crate::error::{BenchError, Result};
use crate::models::{CellScalar, CellType, CellValue};
use crate::normalize::normalize_range;
use crate::specs::{ConditionalFormatSpec, DataValidationSpec, FreezePaneSpec, HyperlinkSpec};

pub(super) struct ParsedWorkbook {
    pub sheets: Vec<SheetModel>,
    pub date1904: bool,
}

type Archive = ZipArchive<BufReader<File>>;

pub(super) fn parse_workbook(path: &Path) -> Result<ParsedWorkbook> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let workbook_xml = read_zip_text(&mut archive, "xl/workbook.xml")?
        .ok_or_else(|| BenchError::FileFormat("missing xl/workbook.xml".into()))?;
    let (sheet_infos, date1904) = parse_workbook_part(&workbook_xml)?;

    let rels = match read_zip_text(&mut archive, "xl/_rels/workbook.xml.rels")? {
        Some(text) => parse_relationships(&text)?,
        None => HashMap::new(),
    };
    let shared = match read_zip_text(&mut archive, "xl/sharedStrings.xml")? {
        Some(text) => parse_shared_strings(&text)?,
        None => Vec::new(),
    };
    let xf_formats = match read_zip_text(&mut archive, "xl/styles.xml")? {
        Some(text) => parse_styles(&text)?,
        None => Vec::new(),
    };

    let mut sheets = Vec::with_capacity(sheet_infos.len());
    for info in &sheet_infos {
        let target = rels
            .get(&info.rid)
            .map(|rel| rel.target.clone())
            .unwrap_or_else(|| format!("worksheets/sheet{}.xml", sheets.len() + 1));
        let sheet_path = resolve_part_path(&target);
        let text = read_zip_text(&mut archive, &sheet_path)?
            .ok_or_else(|| BenchError::FileFormat(format!("missing sheet part {sheet_path}")))?;
        let sheet_rels = sheet_rels_path(&sheet_path);
        let sheet_rels = match read_zip_text(&mut archive, &sheet_rels)? {
            Some(rels_text) => parse_relationships(&rels_text)?,
            None => HashMap::new(),
        };
        sheets.push(parse_sheet(
            &info.name,
            &text,
            &shared,
            &xf_formats,
            &sheet_rels,
            date1904,
        )?);
    }

    Ok(ParsedWorkbook { sheets, date1904 })
}

fn read_zip_text(archive: &mut Archive, name: &str) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut text = String::new();
            file.read_to_string(&mut text)?;
            Ok(Some(text))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn resolve_part_path(target: &str) -> String {
    let target = target.trim_start_matches('/');
    if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{target}")
    }
}

fn sheet_rels_path(sheet_path: &str) -> String {
    match sheet_path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{sheet_path}.rels"),
    }
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Read the text content of the element just opened, consuming through its
/// end tag.
fn read_element_text(xml: &mut Reader<&[u8]>, end: &[u8]) -> Option<String> {
    let mut text: Option<String> = None;
    loop {
        match xml.read_event() {
            Ok(Event::Text(t)) => {
                text = t.unescape().ok().map(|s| s.into_owned());
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == end => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    text
}

struct SheetInfo {
    name: String,
    rid: String,
}

fn parse_workbook_part(text: &str) -> Result<(Vec<SheetInfo>, bool)> {
    let mut xml = Reader::from_str(text);
    xml.trim_text(true);
    let mut infos = Vec::new();
    let mut date1904 = false;

    loop {
        match xml.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    date1904 = matches!(attr(e, b"date1904").as_deref(), Some("1" | "true"));
                }
                b"sheet" => {
                    let name = attr(e, b"name").unwrap_or_default();
                    let rid = attr(e, b"r:id")
                        .or_else(|| attr(e, b"id"))
                        .unwrap_or_default();
                    infos.push(SheetInfo { name, rid });
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
    }
    Ok((infos, date1904))
}

struct Relationship {
    target: String,
    external: bool,
}

fn parse_relationships(text: &str) -> Result<HashMap<String, Relationship>> {
    let mut xml = Reader::from_str(text);
    xml.trim_text(true);
    let mut rels = HashMap::new();

    loop {
        match xml.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr(e, b"Id").unwrap_or_default();
                let target = attr(e, b"Target").unwrap_or_default();
                let external = attr(e, b"TargetMode").as_deref() == Some("External");
                rels.insert(id, Relationship { target, external });
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
    }
    Ok(rels)
}

fn parse_shared_strings(text: &str) -> Result<Vec<String>> {
    let mut xml = Reader::from_str(text);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match xml.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = current.is_some(),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                if let (Some(acc), Ok(piece)) = (current.as_mut(), t.unescape()) {
                    acc.push_str(&piece);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    strings.push(current.take().unwrap_or_default());
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
    }
    Ok(strings)
}

/// Format codes for the builtin numFmt ids fixtures can encounter.
fn builtin_format(id: u32) -> Option<&'static str> {
    Some(match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        49 => "@",
        _ => return None,
    })
}

/// Per-xf-index format codes; `None` means General.
fn parse_styles(text: &str) -> Result<Vec<Option<String>>> {
    let mut xml = Reader::from_str(text);
    xml.trim_text(true);
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_formats = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr(e, b"numFmtId").and_then(|v| v.parse().ok());
                    let code = attr(e, b"formatCode");
                    if let (Some(id), Some(code)) = (id, code) {
                        custom.insert(id, code);
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let id: u32 = attr(e, b"numFmtId")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                    let code = custom
                        .get(&id)
                        .cloned()
                        .or_else(|| builtin_format(id).map(String::from));
                    xf_formats.push(code);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                in_cell_xfs = false;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
    }
    Ok(xf_formats)
}

/// Whether a format code displays its number as a date or time. Quoted
/// literals, bracketed sections, and backslash escapes don't count.
pub(super) fn is_date_format(code: &str) -> bool {
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '[' => {
                for q in chars.by_ref() {
                    if q == ']' {
                        break;
                    }
                }
            }
            '\\' => {
                chars.next();
            }
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' => return true,
            'm' | 'M' => return true,
            _ => {}
        }
    }
    false
}

fn has_time_section(code: &str) -> bool {
    code.chars().any(|c| matches!(c, 'h' | 'H' | 's' | 'S')) || code.contains(':')
}

#[derive(Default)]
struct PendingCell {
    reference: String,
    type_tag: String,
    style_idx: Option<usize>,
    raw: Option<String>,
    formula: Option<String>,
}

fn classify_cell(
    pending: PendingCell,
    shared: &[String],
    xf_formats: &[Option<String>],
    date1904: bool,
) -> (String, CellEntry) {
    let number_format = pending
        .style_idx
        .and_then(|idx| xf_formats.get(idx))
        .and_then(Clone::clone);

    let mut value = match (pending.raw.as_deref(), pending.type_tag.as_str()) {
        (None, _) => CellValue::blank(),
        (Some(raw), "s") => raw
            .parse::<usize>()
            .ok()
            .and_then(|idx| shared.get(idx))
            .map_or_else(CellValue::blank, |s| CellValue::string(s.clone())),
        (Some(raw), "b") => CellValue::boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),
        (Some(raw), "e") => CellValue {
            cell_type: CellType::Error,
            value: Some(CellScalar::Text(raw.to_string())),
            formula: None,
        },
        (Some(raw), "str" | "inlineStr") => CellValue::string(raw.to_string()),
        (Some(raw), "d") => iso_cell(raw).unwrap_or_else(|| CellValue::string(raw.to_string())),
        (Some(raw), _) => match raw.parse::<f64>() {
            Ok(n) => match number_format.as_deref().filter(|code| is_date_format(code)) {
                Some(code) => serial_cell(n, code, date1904),
                None => CellValue::number(n),
            },
            Err(_) => CellValue::string(raw.to_string()),
        },
    };

    if let Some(formula) = pending.formula {
        value.cell_type = CellType::Formula;
        value.formula = Some(if formula.starts_with('=') {
            formula
        } else {
            format!("={formula}")
        });
    }

    (
        pending.reference,
        CellEntry {
            value,
            number_format,
        },
    )
}

fn iso_cell(raw: &str) -> Option<CellValue> {
    let parts = dates::parse_iso(raw)?;
    Some(CellValue {
        cell_type: if parts.has_time {
            CellType::Datetime
        } else {
            CellType::Date
        },
        value: Some(CellScalar::Text(parts.to_iso())),
        formula: None,
    })
}

fn serial_cell(serial: f64, code: &str, date1904: bool) -> CellValue {
    let mut parts = dates::serial_to_parts(serial, date1904);
    if !parts.has_time && has_time_section(code) && serial.fract() != 0.0 {
        parts.has_time = true;
    }
    CellValue {
        cell_type: if parts.has_time {
            CellType::Datetime
        } else {
            CellType::Date
        },
        value: Some(CellScalar::Text(parts.to_iso())),
        formula: None,
    }
}

#[allow(clippy::too_many_lines)]
fn parse_sheet(
    name: &str,
    text: &str,
    shared: &[String],
    xf_formats: &[Option<String>],
    rels: &HashMap<String, Relationship>,
    date1904: bool,
) -> Result<SheetModel> {
    let mut xml = Reader::from_str(text);
    let mut sheet = SheetModel::named(name);
    let mut in_sheet_view = false;

    loop {
        match xml.read_event() {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"sheetView" => in_sheet_view = true,
                    b"pane" if in_sheet_view => {
                        sheet.freeze = Some(parse_pane(e));
                    }
                    b"row" => {
                        let row: Option<u32> = attr(e, b"r").and_then(|v| v.parse().ok());
                        let height: Option<f64> = attr(e, b"ht").and_then(|v| v.parse().ok());
                        if let (Some(row), Some(height)) = (row, height) {
                            sheet.row_heights.insert(row, height);
                        }
                    }
                    b"col" => {
                        let min: Option<u32> = attr(e, b"min").and_then(|v| v.parse().ok());
                        let max: Option<u32> = attr(e, b"max").and_then(|v| v.parse().ok());
                        let width: Option<f64> = attr(e, b"width").and_then(|v| v.parse().ok());
                        if let (Some(min), Some(max), Some(width)) = (min, max, width) {
                            for col in min..=max.max(min) {
                                sheet
                                    .col_widths
                                    .insert(col_to_letter(col.saturating_sub(1)), width);
                            }
                        }
                    }
                    b"c" => {
                        let mut pending = PendingCell {
                            reference: attr(e, b"r").unwrap_or_default(),
                            type_tag: attr(e, b"t").unwrap_or_default(),
                            style_idx: attr(e, b"s").and_then(|v| v.parse().ok()),
                            ..PendingCell::default()
                        };
                        if is_start {
                            read_cell_children(&mut xml, &mut pending);
                        }
                        let (reference, entry) =
                            classify_cell(pending, shared, xf_formats, date1904);
                        if let Some((col, row)) = parse_cell_ref(&reference) {
                            sheet.cells.insert((row, col), entry);
                        }
                    }
                    b"mergeCell" => {
                        if let Some(reference) = attr(e, b"ref") {
                            sheet.merges.push(normalize_range(&reference));
                        }
                    }
                    b"dataValidation" => {
                        let validation = parse_validation(e, is_start.then_some(&mut xml));
                        sheet.validations.push(validation);
                    }
                    b"conditionalFormatting" if is_start => {
                        let sqref = attr(e, b"sqref").unwrap_or_default();
                        parse_conditional_block(&mut xml, &sqref, &mut sheet.cf_rules);
                    }
                    b"hyperlink" => {
                        if let Some(link) = parse_hyperlink(e, rels) {
                            sheet.hyperlinks.push(link);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"sheetView" => {
                in_sheet_view = false;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
    }
    Ok(sheet)
}

fn read_cell_children(xml: &mut Reader<&[u8]>, pending: &mut PendingCell) {
    loop {
        match xml.read_event() {
            Ok(Event::Start(ref inner)) => match inner.local_name().as_ref() {
                b"v" | b"t" => {
                    pending.raw = read_element_text(xml, inner.local_name().as_ref());
                }
                b"f" => {
                    pending.formula = read_element_text(xml, b"f");
                }
                b"is" => {
                    // Inline string container; its <t> carries the value.
                }
                _ => {}
            },
            Ok(Event::End(ref inner)) if inner.local_name().as_ref() == b"c" => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
}

fn parse_pane(e: &BytesStart<'_>) -> FreezePaneSpec {
    let state = attr(e, b"state").unwrap_or_default();
    let mode = match state.as_str() {
        "frozen" | "frozenSplit" => "freeze",
        _ => "split",
    };
    FreezePaneSpec {
        mode: mode.into(),
        top_left_cell: attr(e, b"topLeftCell"),
        x_split: attr(e, b"xSplit").and_then(|v| v.parse().ok()),
        y_split: attr(e, b"ySplit").and_then(|v| v.parse().ok()),
        active_pane: attr(e, b"activePane"),
    }
}

fn parse_validation(
    e: &BytesStart<'_>,
    xml: Option<&mut Reader<&[u8]>>,
) -> DataValidationSpec {
    let mut spec = DataValidationSpec {
        range: attr(e, b"sqref").unwrap_or_default(),
        validation_type: attr(e, b"type").unwrap_or_default(),
        operator: attr(e, b"operator"),
        allow_blank: attr(e, b"allowBlank").map(|v| v == "1"),
        show_input: attr(e, b"showInputMessage").map(|v| v == "1"),
        show_error: attr(e, b"showErrorMessage").map(|v| v == "1"),
        prompt_title: attr(e, b"promptTitle"),
        prompt: attr(e, b"prompt"),
        error_title: attr(e, b"errorTitle"),
        error: attr(e, b"error"),
        ..DataValidationSpec::default()
    };

    if let Some(xml) = xml {
        loop {
            match xml.read_event() {
                Ok(Event::Start(ref inner)) => match inner.local_name().as_ref() {
                    b"formula1" => spec.formula1 = read_element_text(xml, b"formula1"),
                    b"formula2" => spec.formula2 = read_element_text(xml, b"formula2"),
                    _ => {}
                },
                Ok(Event::End(ref inner))
                    if inner.local_name().as_ref() == b"dataValidation" =>
                {
                    break;
                }
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
        }
    }
    spec
}

fn parse_conditional_block(
    xml: &mut Reader<&[u8]>,
    sqref: &str,
    rules: &mut Vec<ConditionalFormatSpec>,
) {
    loop {
        match xml.read_event() {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                if e.local_name().as_ref() != b"cfRule" {
                    continue;
                }
                let mut rule = ConditionalFormatSpec {
                    range: sqref.to_string(),
                    rule_type: attr(e, b"type").unwrap_or_default(),
                    operator: attr(e, b"operator"),
                    priority: attr(e, b"priority").and_then(|v| v.parse().ok()),
                    stop_if_true: attr(e, b"stopIfTrue").map(|v| v == "1"),
                    ..ConditionalFormatSpec::default()
                };
                if matches!(event, Event::Start(_)) {
                    loop {
                        match xml.read_event() {
                            Ok(Event::Start(ref inner))
                                if inner.local_name().as_ref() == b"formula" =>
                            {
                                rule.formula = read_element_text(xml, b"formula");
                            }
                            Ok(Event::End(ref inner))
                                if inner.local_name().as_ref() == b"cfRule" =>
                            {
                                break;
                            }
                            Ok(Event::Eof) | Err(_) => break,
                            _ => {}
                        }
                    }
                }
                rules.push(rule);
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"conditionalFormatting" => {
                break;
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
}

fn parse_hyperlink(
    e: &BytesStart<'_>,
    rels: &HashMap<String, Relationship>,
) -> Option<HyperlinkSpec> {
    let cell = attr(e, b"ref")?;
    let location = attr(e, b"location");
    let rid = attr(e, b"r:id");

    let (target, internal) = match (&rid, &location) {
        (Some(rid), _) => {
            let rel = rels.get(rid)?;
            (rel.target.clone(), !rel.external)
        }
        (None, Some(loc)) => (loc.clone(), true),
        (None, None) => return None,
    };

    Some(HyperlinkSpec {
        cell,
        target,
        display: attr(e, b"display"),
        tooltip: attr(e, b"tooltip"),
        internal: Some(internal),
    })
}
