//! Re-Validator: compares gap lists before and after fixing.

use std::collections::BTreeSet;

use serde::Serialize;

use super::detector::detect_gaps;
use super::document::Document;
use super::rules::{Gap, GapRecord, RuleCatalog, Severity};
use crate::error::{AuditError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Revalidation {
    /// Present before, gone after.
    pub closed: Vec<GapRecord>,
    /// Present before and after.
    pub residual: Vec<GapRecord>,
    /// Absent before, present after. Non-empty only if a fix misbehaved.
    pub regressed: Vec<GapRecord>,
}

impl Revalidation {
    /// Every gap present after fixing, in detector order.
    #[must_use]
    pub fn remaining(&self) -> Vec<GapRecord> {
        let mut remaining: Vec<GapRecord> = self
            .residual
            .iter()
            .chain(&self.regressed)
            .cloned()
            .collect();
        remaining.sort_by(|a, b| a.code.cmp(&b.code));
        remaining
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.residual.is_empty() && self.regressed.is_empty()
    }

    /// Residual gaps whose automatic fix was skipped become manual-review.
    pub fn downgrade_skipped(&mut self, skipped: &BTreeSet<Gap>) {
        for gap in &mut self.residual {
            if skipped.contains(&gap.code) {
                gap.severity = Severity::ManualReview;
            }
        }
    }

    pub fn ensure_no_regressions(&self, path: &str) -> Result<()> {
        if self.regressed.is_empty() {
            return Ok(());
        }
        Err(AuditError::RegressionDetected {
            path: path.to_string(),
            codes: self.regressed.iter().map(|gap| gap.code.code()).collect(),
        })
    }
}

/// Re-run detection on `after` and classify against `before`. Gaps are
/// compared by code; details may legitimately change.
#[must_use]
pub fn revalidate(before: &[GapRecord], after: &Document, catalog: &RuleCatalog) -> Revalidation {
    let now = detect_gaps(after, catalog);
    let mut result = Revalidation::default();

    for gap in before {
        if now.iter().any(|current| current.code == gap.code) {
            result.residual.push(gap.clone());
        } else {
            result.closed.push(gap.clone());
        }
    }
    result.regressed = now
        .into_iter()
        .filter(|current| !before.iter().any(|gap| gap.code == current.code))
        .collect();
    result
}
