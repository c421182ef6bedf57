//! Write-verifier selection.
//!
//! A write case is judged by reading the produced file back with a second
//! adapter, the verifier. Which adapter plays verifier is policy: the
//! default library oracle is fast and covers most features, an interactive
//! (application-driving) oracle reads back features libraries rarely do,
//! and legacy `.xls` output needs a reader that handles that format at all.

use log::warn;

use crate::adapter::SpreadsheetAdapter;
use crate::registry::AdapterRegistry;
use crate::runner::Feature;

/// Env var overriding verifier selection. Read once at startup.
pub const WRITE_ORACLE_ENV: &str = "EXCELBENCH_WRITE_ORACLE";

/// Which verifier the harness should prefer for write cases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OracleChoice {
    /// Interactive when it helps, default otherwise.
    #[default]
    Auto,
    /// Always the default library oracle.
    Default,
    /// Always the interactive oracle when one is registered.
    Interactive,
}

impl OracleChoice {
    /// Historical values accepted: `openpyxl` named the original default
    /// oracle, `excel` the interactive one. Anything else means Auto.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openpyxl" | "default" => Self::Default,
            "excel" | "interactive" => Self::Interactive,
            _ => Self::Auto,
        }
    }
}

/// Run-wide configuration, captured once at startup.
#[derive(Clone, Copy, Debug, Default)]
pub struct HarnessConfig {
    pub write_oracle: OracleChoice,
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        let write_oracle = std::env::var(WRITE_ORACLE_ENV)
            .map(|v| OracleChoice::parse(&v))
            .unwrap_or_default();
        Self { write_oracle }
    }
}

/// Features whose default-oracle round trips are historically unreliable;
/// Auto prefers the interactive oracle for these.
fn prefers_interactive(feature: Feature) -> bool {
    matches!(
        feature,
        Feature::Images | Feature::PivotTables | Feature::Comments
    )
}

fn interactive_or_default<'a>(
    registry: &'a AdapterRegistry,
) -> Option<&'a dyn SpreadsheetAdapter> {
    match registry.interactive_oracle() {
        Some(adapter) => Some(adapter),
        None => registry.default_oracle(),
    }
}

/// Pick the write verifier for the run as a whole.
pub fn select_write_verifier<'a>(
    registry: &'a AdapterRegistry,
    config: &HarnessConfig,
) -> Option<&'a dyn SpreadsheetAdapter> {
    match config.write_oracle {
        OracleChoice::Default => registry.default_oracle(),
        OracleChoice::Interactive => {
            let interactive = registry.interactive_oracle();
            if interactive.is_none() {
                warn!("interactive oracle requested but none registered; using default");
            }
            interactive.or_else(|| registry.default_oracle())
        }
        OracleChoice::Auto => interactive_or_default(registry),
    }
}

/// Pick the write verifier for one feature. Under Auto, only features with
/// unreliable default round-trips get the interactive oracle.
pub fn select_write_verifier_for_feature<'a>(
    registry: &'a AdapterRegistry,
    config: &HarnessConfig,
    feature: Feature,
) -> Option<&'a dyn SpreadsheetAdapter> {
    match config.write_oracle {
        OracleChoice::Auto => {
            if prefers_interactive(feature) {
                interactive_or_default(registry)
            } else {
                registry.default_oracle()
            }
        }
        _ => select_write_verifier(registry, config),
    }
}

/// Pick the verifier for one writing adapter's output. Legacy `.xls` output
/// overrides all other policy: it needs a reader that opens `.xls` at all.
pub fn select_write_verifier_for_adapter<'a>(
    registry: &'a AdapterRegistry,
    config: &HarnessConfig,
    writer: &dyn SpreadsheetAdapter,
    feature: Feature,
) -> Option<&'a dyn SpreadsheetAdapter> {
    if writer.output_extension().eq_ignore_ascii_case("xls") {
        if let Some(reader) = registry.legacy_reader() {
            return Some(reader);
        }
        warn!("no legacy reader registered for .xls output; using default oracle");
        return registry.default_oracle();
    }
    select_write_verifier_for_feature(registry, config, feature)
}
