//! The adapter contract every benchmarked library implements.
//!
//! Both traits are object safe; the registry and runner only ever see
//! `Box<dyn SpreadsheetAdapter>` and `Box<dyn Workbook>`. Read accessors
//! default to sentinel values (empty, `None`) and write accessors to no-ops,
//! so an adapter only overrides what its library genuinely supports; the
//! read-back comparison then fails honestly instead of erroring.

use std::path::Path;

use crate::error::{BenchError, Result};
use crate::models::{BorderInfo, CellFormat, CellValue, JsonMap, LibraryInfo};
use crate::specs::{
    CommentSpec, ConditionalFormatSpec, DataValidationSpec, FreezePaneSpec, HyperlinkSpec,
    ImageSpec, PivotSpec,
};

fn path_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// One benchmarked spreadsheet library.
pub trait SpreadsheetAdapter {
    /// Name, version, and declared capabilities.
    fn info(&self) -> LibraryInfo;

    /// Whether this adapter drives a real spreadsheet application rather
    /// than a file-format library. Interactive adapters are preferred as
    /// write verifiers for features libraries rarely read back.
    fn is_interactive(&self) -> bool {
        false
    }

    /// File extensions (lowercase, no dot) this adapter can open.
    fn supported_read_extensions(&self) -> &[&str] {
        &["xlsx"]
    }

    /// Extension of files this adapter produces.
    fn output_extension(&self) -> &str {
        "xlsx"
    }

    fn can_read(&self) -> bool {
        self.info().can_read()
    }

    fn can_write(&self) -> bool {
        self.info().can_write()
    }

    fn supports_read_path(&self, path: &Path) -> bool {
        self.can_read()
            && path_extension(path)
                .is_some_and(|ext| self.supported_read_extensions().contains(&ext.as_str()))
    }

    /// Open an existing workbook for reading.
    fn open_workbook(&self, path: &Path) -> Result<Box<dyn Workbook>>;

    /// Create a new workbook that [`Workbook::save`] will write to `path`.
    fn create_workbook(&self, path: &Path) -> Result<Box<dyn Workbook>>;
}

/// An open workbook, readable and (capability permitting) writable.
#[allow(unused_variables)]
pub trait Workbook {
    fn sheet_names(&self) -> Result<Vec<String>>;

    /// Typed cell content: type, value, and formula if any.
    fn read_cell(&self, sheet: &str, cell: &str) -> Result<CellValue>;

    fn read_format(&self, sheet: &str, cell: &str) -> Result<CellFormat> {
        Ok(CellFormat::default())
    }

    fn read_border(&self, sheet: &str, cell: &str) -> Result<BorderInfo> {
        Ok(BorderInfo::default())
    }

    fn merged_ranges(&self, sheet: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Conditional-formatting rules in wire-map form.
    fn conditional_formats(&self, sheet: &str) -> Result<Vec<JsonMap>> {
        Ok(Vec::new())
    }

    /// Data-validation rules in wire-map form.
    fn data_validations(&self, sheet: &str) -> Result<Vec<JsonMap>> {
        Ok(Vec::new())
    }

    fn hyperlink(&self, sheet: &str, cell: &str) -> Result<Option<JsonMap>> {
        Ok(None)
    }

    fn images(&self, sheet: &str) -> Result<Vec<JsonMap>> {
        Ok(Vec::new())
    }

    fn pivot_tables(&self, sheet: &str) -> Result<Vec<JsonMap>> {
        Ok(Vec::new())
    }

    fn comment(&self, sheet: &str, cell: &str) -> Result<Option<JsonMap>> {
        Ok(None)
    }

    fn freeze_panes(&self, sheet: &str) -> Result<Option<JsonMap>> {
        Ok(None)
    }

    /// Height in points of a 1-based row, if explicitly set.
    fn row_height(&self, sheet: &str, row: u32) -> Result<Option<f64>> {
        Ok(None)
    }

    /// Width in characters of a column letter, if explicitly set.
    fn column_width(&self, sheet: &str, column: &str) -> Result<Option<f64>> {
        Ok(None)
    }

    fn add_sheet(&mut self, name: &str) -> Result<()> {
        Ok(())
    }

    fn write_cell(&mut self, sheet: &str, cell: &str, value: &CellValue) -> Result<()> {
        Ok(())
    }

    fn write_format(&mut self, sheet: &str, cell: &str, format: &CellFormat) -> Result<()> {
        Ok(())
    }

    fn write_border(&mut self, sheet: &str, cell: &str, border: &BorderInfo) -> Result<()> {
        Ok(())
    }

    fn merge_cells(&mut self, sheet: &str, range: &str) -> Result<()> {
        Ok(())
    }

    fn add_conditional_format(
        &mut self,
        sheet: &str,
        spec: &ConditionalFormatSpec,
    ) -> Result<()> {
        Ok(())
    }

    fn add_data_validation(&mut self, sheet: &str, spec: &DataValidationSpec) -> Result<()> {
        Ok(())
    }

    fn add_hyperlink(&mut self, sheet: &str, spec: &HyperlinkSpec) -> Result<()> {
        Ok(())
    }

    fn add_image(&mut self, sheet: &str, spec: &ImageSpec) -> Result<()> {
        Ok(())
    }

    fn add_pivot_table(&mut self, sheet: &str, spec: &PivotSpec) -> Result<()> {
        Ok(())
    }

    fn add_comment(&mut self, sheet: &str, spec: &CommentSpec) -> Result<()> {
        Ok(())
    }

    fn set_freeze_panes(&mut self, sheet: &str, spec: &FreezePaneSpec) -> Result<()> {
        Ok(())
    }

    fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<()> {
        Ok(())
    }

    fn set_column_width(&mut self, sheet: &str, column: &str, width: f64) -> Result<()> {
        Ok(())
    }

    /// Persist the workbook to the path it was created with.
    fn save(&mut self) -> Result<()> {
        Err(BenchError::Unsupported("save".into()))
    }

    /// Release any held resources. Idempotent; the runner calls this on
    /// every exit path.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::Capability;
    use std::collections::BTreeSet;

    struct ReadOnly;

    struct ReadOnlyBook;

    impl Workbook for ReadOnlyBook {
        fn sheet_names(&self) -> Result<Vec<String>> {
            Ok(vec!["Sheet1".into()])
        }

        fn read_cell(&self, _sheet: &str, _cell: &str) -> Result<CellValue> {
            Ok(CellValue::string("x"))
        }
    }

    impl SpreadsheetAdapter for ReadOnly {
        fn info(&self) -> LibraryInfo {
            LibraryInfo {
                name: "readonly".into(),
                version: "1.0".into(),
                language: "rust".into(),
                capabilities: BTreeSet::from([Capability::Read]),
            }
        }

        fn open_workbook(&self, _path: &Path) -> Result<Box<dyn Workbook>> {
            Ok(Box::new(ReadOnlyBook))
        }

        fn create_workbook(&self, _path: &Path) -> Result<Box<dyn Workbook>> {
            Err(BenchError::Unsupported("create".into()))
        }
    }

    #[test]
    fn capability_flags_follow_info() {
        let adapter = ReadOnly;
        assert!(adapter.can_read());
        assert!(!adapter.can_write());
    }

    #[test]
    fn read_path_support_checks_extension() {
        let adapter = ReadOnly;
        assert!(adapter.supports_read_path(Path::new("/tmp/file.xlsx")));
        assert!(adapter.supports_read_path(Path::new("/tmp/FILE.XLSX")));
        assert!(!adapter.supports_read_path(Path::new("/tmp/file.xls")));
        assert!(!adapter.supports_read_path(Path::new("/tmp/noext")));
    }

    #[test]
    fn default_reads_are_sentinels() {
        let book = ReadOnlyBook;
        assert_eq!(book.read_format("Sheet1", "B2").unwrap(), CellFormat::default());
        assert!(book.merged_ranges("Sheet1").unwrap().is_empty());
        assert!(book.hyperlink("Sheet1", "B2").unwrap().is_none());
        assert!(book.freeze_panes("Sheet1").unwrap().is_none());
        assert!(book.row_height("Sheet1", 2).unwrap().is_none());
    }

    #[test]
    fn default_writes_are_noops_and_save_errors() {
        let mut book = ReadOnlyBook;
        assert!(book.write_cell("Sheet1", "B2", &CellValue::blank()).is_ok());
        assert!(book.merge_cells("Sheet1", "A1:B2").is_ok());
        assert!(matches!(book.save(), Err(BenchError::Unsupported(_))));
        assert!(book.close().is_ok());
    }
}
