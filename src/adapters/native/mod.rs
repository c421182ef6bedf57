//! Built-in `.xlsx` adapter over `zip` + `quick-xml`.
//!
//! Serves two roles: fixture reader and default write oracle. The workbook
//! is fully materialized into an in-memory model on open; reads never touch
//! the archive again, and `save` regenerates every part from the model.
//!
//! Coverage is deliberately scoped to what fixtures exercise: values (with
//! typed dates via number-format detection), formulas, number formats,
//! merges, validations, conditional formats, hyperlinks, freeze panes, and
//! row/column dimensions. Font, fill, border, image, pivot, and comment
//! accessors keep their sentinel defaults.

mod read;
mod write;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::adapter::{SpreadsheetAdapter, Workbook};
use crate::cell_ref::parse_cell_ref;
use crate::error::{BenchError, Result};
use crate::models::{Capability, CellFormat, CellValue, JsonMap, LibraryInfo};
use crate::normalize::normalize_range;
use crate::specs::{
    ConditionalFormatSpec, DataValidationSpec, FreezePaneSpec, HyperlinkSpec,
};

/// One cell of the in-memory model.
#[derive(Clone, Debug, Default)]
pub(crate) struct CellEntry {
    pub value: CellValue,
    pub number_format: Option<String>,
}

/// One sheet of the in-memory model. Cell keys are 0-based (row, col);
/// row heights are keyed by 1-based row, column widths by column letters.
#[derive(Clone, Debug, Default)]
pub(crate) struct SheetModel {
    pub name: String,
    pub cells: BTreeMap<(u32, u32), CellEntry>,
    pub merges: Vec<String>,
    pub validations: Vec<DataValidationSpec>,
    pub cf_rules: Vec<ConditionalFormatSpec>,
    pub hyperlinks: Vec<HyperlinkSpec>,
    pub freeze: Option<FreezePaneSpec>,
    pub row_heights: BTreeMap<u32, f64>,
    pub col_widths: BTreeMap<String, f64>,
}

impl SheetModel {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

fn inner_map(mut outer: JsonMap, key: &str) -> JsonMap {
    match outer.remove(key) {
        Some(Value::Object(map)) => map,
        _ => JsonMap::new(),
    }
}

pub struct NativeAdapter;

impl NativeAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetAdapter for NativeAdapter {
    fn info(&self) -> LibraryInfo {
        LibraryInfo {
            name: "native".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            language: "rust".into(),
            capabilities: [Capability::Read, Capability::Write].into_iter().collect(),
        }
    }

    fn open_workbook(&self, path: &Path) -> Result<Box<dyn Workbook>> {
        let parsed = read::parse_workbook(path)?;
        Ok(Box::new(NativeWorkbook {
            path: path.to_path_buf(),
            date1904: parsed.date1904,
            sheets: parsed.sheets,
        }))
    }

    fn create_workbook(&self, path: &Path) -> Result<Box<dyn Workbook>> {
        Ok(Box::new(NativeWorkbook {
            path: path.to_path_buf(),
            date1904: false,
            sheets: Vec::new(),
        }))
    }
}

pub struct NativeWorkbook {
    path: PathBuf,
    date1904: bool,
    sheets: Vec<SheetModel>,
}

impl NativeWorkbook {
    fn sheet(&self, name: &str) -> Result<&SheetModel> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| BenchError::Sheet(name.to_string()))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut SheetModel> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| BenchError::Sheet(name.to_string()))
    }

    fn cell_key(cell: &str) -> Result<(u32, u32)> {
        let (col, row) = parse_cell_ref(cell).ok_or_else(|| BenchError::CellRef(cell.into()))?;
        Ok((row, col))
    }
}

impl Workbook for NativeWorkbook {
    fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }

    fn read_cell(&self, sheet: &str, cell: &str) -> Result<CellValue> {
        let key = Self::cell_key(cell)?;
        Ok(self
            .sheet(sheet)?
            .cells
            .get(&key)
            .map_or_else(CellValue::blank, |entry| entry.value.clone()))
    }

    fn read_format(&self, sheet: &str, cell: &str) -> Result<CellFormat> {
        let key = Self::cell_key(cell)?;
        let number_format = self
            .sheet(sheet)?
            .cells
            .get(&key)
            .and_then(|entry| entry.number_format.clone());
        Ok(CellFormat {
            number_format,
            ..CellFormat::default()
        })
    }

    fn merged_ranges(&self, sheet: &str) -> Result<Vec<String>> {
        Ok(self.sheet(sheet)?.merges.clone())
    }

    fn conditional_formats(&self, sheet: &str) -> Result<Vec<JsonMap>> {
        Ok(self
            .sheet(sheet)?
            .cf_rules
            .iter()
            .map(|rule| inner_map(rule.to_expected(), "cf_rule"))
            .collect())
    }

    fn data_validations(&self, sheet: &str) -> Result<Vec<JsonMap>> {
        Ok(self
            .sheet(sheet)?
            .validations
            .iter()
            .map(|v| inner_map(v.to_expected(), "validation"))
            .collect())
    }

    fn hyperlink(&self, sheet: &str, cell: &str) -> Result<Option<JsonMap>> {
        Ok(self
            .sheet(sheet)?
            .hyperlinks
            .iter()
            .find(|h| h.cell.eq_ignore_ascii_case(cell))
            .map(|h| inner_map(h.to_expected(), "hyperlink")))
    }

    fn freeze_panes(&self, sheet: &str) -> Result<Option<JsonMap>> {
        Ok(self
            .sheet(sheet)?
            .freeze
            .as_ref()
            .map(|f| inner_map(f.to_expected(), "freeze")))
    }

    fn row_height(&self, sheet: &str, row: u32) -> Result<Option<f64>> {
        Ok(self.sheet(sheet)?.row_heights.get(&row).copied())
    }

    fn column_width(&self, sheet: &str, column: &str) -> Result<Option<f64>> {
        Ok(self
            .sheet(sheet)?
            .col_widths
            .get(&column.to_ascii_uppercase())
            .copied())
    }

    fn add_sheet(&mut self, name: &str) -> Result<()> {
        if self.sheets.iter().all(|s| s.name != name) {
            self.sheets.push(SheetModel::named(name));
        }
        Ok(())
    }

    fn write_cell(&mut self, sheet: &str, cell: &str, value: &CellValue) -> Result<()> {
        let key = Self::cell_key(cell)?;
        let entry = self.sheet_mut(sheet)?.cells.entry(key).or_default();
        entry.value = value.clone();
        Ok(())
    }

    fn write_format(&mut self, sheet: &str, cell: &str, format: &CellFormat) -> Result<()> {
        // Only the number format round-trips through this adapter.
        if let Some(code) = &format.number_format {
            let key = Self::cell_key(cell)?;
            let entry = self.sheet_mut(sheet)?.cells.entry(key).or_default();
            entry.number_format = Some(code.clone());
        }
        Ok(())
    }

    fn merge_cells(&mut self, sheet: &str, range: &str) -> Result<()> {
        self.sheet_mut(sheet)?.merges.push(normalize_range(range));
        Ok(())
    }

    fn add_conditional_format(
        &mut self,
        sheet: &str,
        spec: &ConditionalFormatSpec,
    ) -> Result<()> {
        self.sheet_mut(sheet)?.cf_rules.push(spec.clone());
        Ok(())
    }

    fn add_data_validation(&mut self, sheet: &str, spec: &DataValidationSpec) -> Result<()> {
        self.sheet_mut(sheet)?.validations.push(spec.clone());
        Ok(())
    }

    fn add_hyperlink(&mut self, sheet: &str, spec: &HyperlinkSpec) -> Result<()> {
        self.sheet_mut(sheet)?.hyperlinks.push(spec.clone());
        Ok(())
    }

    fn set_freeze_panes(&mut self, sheet: &str, spec: &FreezePaneSpec) -> Result<()> {
        self.sheet_mut(sheet)?.freeze = Some(spec.clone());
        Ok(())
    }

    fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<()> {
        self.sheet_mut(sheet)?.row_heights.insert(row, height);
        Ok(())
    }

    fn set_column_width(&mut self, sheet: &str, column: &str, width: f64) -> Result<()> {
        self.sheet_mut(sheet)?
            .col_widths
            .insert(column.to_ascii_uppercase(), width);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        write::save_workbook(&self.path, &self.sheets, self.date1904)
    }
}
