//! Results-file schema.
//!
//! A results file is the durable artifact of a run: metadata, the library
//! roster, and per-(feature, library) scores with their case outcomes.
//! Older files used a flat per-case record instead of the split read/write
//! form; deserialization accepts both and treats the flat form as a read
//! result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Importance, JsonMap, LibraryInfo, Operation};

/// Schema version written into new results files.
pub const BENCHMARK_VERSION: &str = "1.0";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunMetadata {
    pub benchmark_version: String,
    /// ISO-8601 date of the run.
    pub run_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel_version: Option<String>,
    pub platform: String,
    /// Which verifier policy was in effect, e.g. "auto".
    pub profile: String,
}

/// One case outcome as recorded in a results file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CaseRecord {
    pub passed: bool,
    pub expected: JsonMap,
    pub actual: JsonMap,
    pub importance: Importance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Read and write outcomes for one test case.
///
/// Untagged deserialization tries variants in order and ignores unknown
/// fields, so the legacy flat record must come first: it demands
/// `passed`/`expected`/`actual`/`importance`, which a split-form object
/// lacks, while the all-optional split variant would swallow anything.
/// A flat record is interpreted as a read result.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CaseOutcomes {
    Legacy(CaseRecord),
    Split {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        read: Option<CaseRecord>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        write: Option<CaseRecord>,
    },
}

impl CaseOutcomes {
    pub fn read(&self) -> Option<&CaseRecord> {
        match self {
            Self::Split { read, .. } => read.as_ref(),
            Self::Legacy(record) => Some(record),
        }
    }

    pub fn write(&self) -> Option<&CaseRecord> {
        match self {
            Self::Split { write, .. } => write.as_ref(),
            Self::Legacy(_) => None,
        }
    }

    /// The record for a given operation, if present.
    pub fn for_operation(&self, op: Operation) -> Option<&CaseRecord> {
        match op {
            Operation::Read => self.read(),
            Operation::Write => self.write(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Scores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureResult {
    pub feature: String,
    pub library: String,
    pub scores: Scores,
    pub test_cases: BTreeMap<String, CaseOutcomes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultsFile {
    pub metadata: RunMetadata,
    pub libraries: BTreeMap<String, LibraryInfo>,
    pub results: Vec<FeatureResult>,
}

impl ResultsFile {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            libraries: BTreeMap::new(),
            results: Vec::new(),
        }
    }

    /// The result block for one (feature, library) pair, if recorded.
    pub fn result_for(&self, feature: &str, library: &str) -> Option<&FeatureResult> {
        self.results
            .iter()
            .find(|r| r.feature == feature && r.library == library)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_outcomes_round_trip() {
        let raw = json!({
            "read": {
                "passed": true,
                "expected": {"value": "x"},
                "actual": {"value": "x"},
                "importance": "basic"
            },
            "write": {
                "passed": false,
                "expected": {"value": "x"},
                "actual": {},
                "importance": "basic",
                "notes": "save failed"
            }
        });
        let outcomes: CaseOutcomes = serde_json::from_value(raw).unwrap();
        assert!(matches!(outcomes, CaseOutcomes::Split { .. }));
        assert!(outcomes.read().unwrap().passed);
        assert!(!outcomes.write().unwrap().passed);
        assert_eq!(outcomes.write().unwrap().notes.as_deref(), Some("save failed"));
    }

    #[test]
    fn legacy_flat_record_reads_as_read_result() {
        let raw = json!({
            "passed": true,
            "expected": {"value": "x"},
            "actual": {"value": "x", "extra": 1},
            "importance": "edge"
        });
        let outcomes: CaseOutcomes = serde_json::from_value(raw).unwrap();
        assert!(matches!(outcomes, CaseOutcomes::Legacy(_)));
        assert!(outcomes.read().unwrap().passed);
        assert!(outcomes.write().is_none());
        assert_eq!(outcomes.read().unwrap().importance, Importance::Edge);
        // The record's payloads survive, they are not dropped by an
        // all-optional variant matching first.
        assert_eq!(
            outcomes.read().unwrap().actual.get("extra"),
            Some(&serde_json::Value::from(1))
        );
    }

    #[test]
    fn read_only_split_form() {
        let raw = json!({
            "read": {
                "passed": true,
                "expected": {},
                "actual": {},
                "importance": "basic"
            }
        });
        let outcomes: CaseOutcomes = serde_json::from_value(raw).unwrap();
        assert!(matches!(outcomes, CaseOutcomes::Split { .. }));
        assert!(outcomes.write().is_none());
        assert!(outcomes.for_operation(Operation::Read).is_some());
        assert!(outcomes.for_operation(Operation::Write).is_none());
    }

    #[test]
    fn results_file_round_trip() {
        let metadata = RunMetadata {
            benchmark_version: BENCHMARK_VERSION.into(),
            run_date: "2026-02-04".into(),
            excel_version: None,
            platform: "linux".into(),
            profile: "auto".into(),
        };
        let mut file = ResultsFile::new(metadata);
        file.results.push(FeatureResult {
            feature: "cell_values".into(),
            library: "native".into(),
            scores: Scores {
                read: Some(3),
                write: Some(2),
            },
            test_cases: BTreeMap::new(),
            notes: None,
        });

        let text = serde_json::to_string_pretty(&file).unwrap();
        let back: ResultsFile = serde_json::from_str(&text).unwrap();
        let result = back.result_for("cell_values", "native").unwrap();
        assert_eq!(result.scores.read, Some(3));
        assert!(back.result_for("cell_values", "other").is_none());
    }

    #[test]
    fn absent_scores_serialize_without_keys() {
        let scores = Scores {
            read: Some(1),
            write: None,
        };
        let text = serde_json::to_string(&scores).unwrap();
        assert_eq!(text, r#"{"read":1}"#);
    }
}
