//! Adapter registration and role lookups.
//!
//! The registry owns every adapter for a run. Registration order is
//! significant: role lookups (default oracle, legacy reader) pick the first
//! adapter that qualifies, so the preferred verifier registers first.

use std::path::Path;

use log::debug;

use crate::adapter::SpreadsheetAdapter;
use crate::error::{BenchError, Result};

pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SpreadsheetAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Register an adapter. Re-registering a name replaces the earlier entry
    /// in place, keeping its position in role-lookup order.
    pub fn register(&mut self, adapter: Box<dyn SpreadsheetAdapter>) {
        let name = adapter.info().name;
        debug!("registering adapter {name}");
        if let Some(slot) = self
            .adapters
            .iter_mut()
            .find(|a| a.info().name == name)
        {
            *slot = adapter;
        } else {
            self.adapters.push(adapter);
        }
    }

    pub fn get(&self, name: &str) -> Result<&dyn SpreadsheetAdapter> {
        self.adapters
            .iter()
            .map(AsRef::as_ref)
            .find(|a| a.info().name == name)
            .ok_or_else(|| BenchError::Other(format!("no adapter registered as '{name}'")))
    }

    pub fn names(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.info().name).collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn SpreadsheetAdapter> {
        self.adapters.iter().map(AsRef::as_ref)
    }

    pub fn readers(&self) -> impl Iterator<Item = &dyn SpreadsheetAdapter> {
        self.all().filter(|a| a.can_read())
    }

    pub fn writers(&self) -> impl Iterator<Item = &dyn SpreadsheetAdapter> {
        self.all().filter(|a| a.can_write())
    }

    /// First registered adapter that both reads and writes. This is the
    /// default write verifier.
    pub fn default_oracle(&self) -> Option<&dyn SpreadsheetAdapter> {
        self.all().find(|a| a.can_read() && a.can_write())
    }

    /// First registered adapter driving a real spreadsheet application.
    pub fn interactive_oracle(&self) -> Option<&dyn SpreadsheetAdapter> {
        self.readers().find(|a| a.is_interactive())
    }

    /// First registered reader that handles legacy `.xls` files.
    pub fn legacy_reader(&self) -> Option<&dyn SpreadsheetAdapter> {
        self.readers()
            .find(|a| a.supported_read_extensions().contains(&"xls"))
    }

    /// Readers able to open a concrete file path.
    pub fn readers_for_path<'a>(
        &'a self,
        path: &'a Path,
    ) -> impl Iterator<Item = &'a dyn SpreadsheetAdapter> {
        self.all().filter(move |a| a.supports_read_path(path))
    }
}
