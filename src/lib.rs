//! xlbench - cross-library conformance benchmark for spreadsheet I/O
//!
//! Runs feature fixtures against pluggable spreadsheet adapters and scores
//! how faithfully each library reads and writes them:
//! - Seventeen features across two tiers (values, formulas, formatting,
//!   merges, conditional formats, validations, panes, ...)
//! - Tolerant comparison of expected vs. actual payloads
//! - Write verification by reading the output back through an oracle
//! - A built-in XLSX adapter so the harness runs with no external libraries
//!
//! # Usage
//!
//! ```no_run
//! use xlbench::adapters::build_registry;
//! use xlbench::oracle::HarnessConfig;
//! use xlbench::runner;
//!
//! # fn main() -> xlbench::error::Result<()> {
//! let config = HarnessConfig::from_env();
//! let registry = build_registry(&config);
//! let adapter = registry.get("native")?;
//! let verifier = xlbench::oracle::select_write_verifier(&registry, &config);
//! # Ok(())
//! # }
//! ```

// Harness core
pub mod adapter;
pub mod compare;
pub mod error;
pub mod matcher;
pub mod models;
pub mod oracle;
pub mod registry;
pub mod report;
pub mod runner;
pub mod score;
pub mod specs;

// Shared plumbing
pub mod cell_ref;
pub mod convert;
pub mod dates;
pub mod normalize;

// Built-in adapter
pub mod adapters;

pub use adapter::{SpreadsheetAdapter, Workbook};
pub use error::{BenchError, Result};
pub use models::{Operation, TestCase, TestFile, TestResult};
pub use runner::Feature;
