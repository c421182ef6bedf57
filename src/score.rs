//! Rolling per-case pass/fail results up into a 0-3 feature score.

use crate::models::{Importance, TestResult};

/// Collapse one feature's case results into a score:
///
/// - `3` — every case passed (basic and edge);
/// - `2` — every basic case passed, at least one edge case failed;
/// - `1` — some but not all basic cases passed;
/// - `0` — no basic case passed, or there were no basic cases at all.
///
/// An empty result set scores 0; edge-only result sets also score 0 since
/// nothing established baseline support.
pub fn calculate_score(results: &[TestResult]) -> u8 {
    let basic: Vec<&TestResult> = results
        .iter()
        .filter(|r| r.importance == Importance::Basic)
        .collect();
    if basic.is_empty() {
        return 0;
    }

    let basic_passed = basic.iter().filter(|r| r.passed).count();
    if basic_passed == 0 {
        return 0;
    }
    if basic_passed < basic.len() {
        return 1;
    }

    let edge_all_passed = results
        .iter()
        .filter(|r| r.importance == Importance::Edge)
        .all(|r| r.passed);
    if edge_all_passed {
        3
    } else {
        2
    }
}
