//! Structured error types for xlbench.
//!
//! Capability violations (`Unsupported`) are caller bugs and are never caught
//! or retried; format errors are fatal for the (feature, library) pair that
//! hit them. Comparison mismatches are never errors — they reduce to a
//! `passed: false` test result.

/// All errors that can occur in the harness and the built-in adapter.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported extension or unparseable file content.
    #[error("File format: {0}")]
    FileFormat(String),

    /// Capability violation: operation not supported by this adapter.
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// Unknown sheet name.
    #[error("No such sheet: {0}")]
    Sheet(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BenchError>;

impl From<String> for BenchError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for BenchError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
